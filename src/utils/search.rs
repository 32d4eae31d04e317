use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

/// 大小写不敏感的“包含”匹配：`LOWER(col) LIKE '%term%'`。
/// Postgres 与 SQLite 行为一致，涉及 join 时传 `(Entity, Column)`。
pub fn icontains<C>(col: C, term: &str) -> SimpleExpr
where
    C: IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(col))).like(format!("%{}%", escape_like(&term.to_lowercase())))
}

// 去掉用户输入里的 LIKE 通配符
fn escape_like(term: &str) -> String {
    term.replace('%', "").replace('_', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_stripped() {
        assert_eq!(escape_like("50%_off"), "50off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
