//! 图书与借阅。
//!
//! `books.is_available` 是派生字段：未归还借阅数 < quantity。
//! 所有会改变借阅数或 quantity 的操作都在同一个事务里完成：
//! 先对图书行加排他锁（`SELECT ... FOR UPDATE`），再写借阅，最后重算可借状态。
//! 同一本书上的并发借阅因此被串行化，最后一本不会被借出两次。

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::error::AppError,
    dtos::{
        library::{
            BookQuery, BookResponse, CreateBookRequest, CreateLoanRequest, LoanQuery, LoanResponse,
            UpdateBookRequest, UpdateLoanRequest,
        },
        search_term,
    },
    entity::{books, borrowed_books},
    utils::search::icontains,
};

/// 可借规则
pub fn is_available(active_loans: u64, quantity: i32) -> bool {
    (active_loans as i64) < i64::from(quantity)
}

fn book_not_found() -> AppError {
    AppError::NotFound("Book not found".to_string())
}

fn loan_not_found() -> AppError {
    AppError::NotFound("Borrowed book record not found".to_string())
}

async fn active_loans<C: ConnectionTrait>(conn: &C, book_id: Uuid) -> Result<u64, DbErr> {
    borrowed_books::Entity::find()
        .filter(borrowed_books::Column::BookId.eq(book_id))
        .filter(borrowed_books::Column::IsReturned.eq(false))
        .count(conn)
        .await
}

/// 加行锁读取图书。必须在事务内调用。
async fn lock_book<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<books::Model, AppError> {
    books::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(book_not_found)
}

/// 按未归还借阅数重算 is_available，只在变化时写库。
async fn recompute_availability<C: ConnectionTrait>(
    conn: &C,
    book: books::Model,
) -> Result<books::Model, AppError> {
    let active = active_loans(conn, book.id).await?;
    let available = is_available(active, book.quantity);
    if book.is_available == available {
        return Ok(book);
    }

    tracing::debug!("📚 Book {} availability -> {} ({} out / {})", book.serial_number, available, active, book.quantity);
    let mut model: books::ActiveModel = book.into();
    model.is_available = Set(available);
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(conn).await?)
}

fn map_serial_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A book with this serial number already exists.".to_string())
        }
        _ => AppError::DatabaseError(e),
    }
}

/// 编号去掉首尾空白后不能为空
fn normalize_serial(raw: &str) -> Result<String, AppError> {
    let serial = raw.trim();
    if serial.is_empty() {
        return Err(AppError::invalid("serial_number", "This field may not be blank."));
    }
    Ok(serial.to_string())
}

async fn ensure_serial_free<C: ConnectionTrait>(
    conn: &C,
    serial: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = books::Entity::find().filter(books::Column::SerialNumber.eq(serial));
    if let Some(id) = except {
        query = query.filter(books::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(AppError::Conflict("A book with this serial number already exists.".to_string()));
    }
    Ok(())
}

// ---------- 图书 ----------

/// 每本书最近一条未归还借阅
async fn latest_active_loans(
    db: &DatabaseConnection,
    books: &[books::Model],
) -> Result<HashMap<Uuid, borrowed_books::Model>, AppError> {
    if books.is_empty() {
        return Ok(HashMap::new());
    }
    let loans = borrowed_books::Entity::find()
        .filter(borrowed_books::Column::BookId.is_in(books.iter().map(|b| b.id)))
        .filter(borrowed_books::Column::IsReturned.eq(false))
        .order_by_desc(borrowed_books::Column::BorrowDate)
        .order_by_desc(borrowed_books::Column::CreatedAt)
        .all(db)
        .await?;

    let mut latest = HashMap::new();
    for loan in loans {
        latest.entry(loan.book_id).or_insert(loan);
    }
    Ok(latest)
}

fn with_active_loan(
    book: books::Model,
    latest: &mut HashMap<Uuid, borrowed_books::Model>,
) -> BookResponse {
    let active_loan = latest.remove(&book.id).map(|loan| LoanResponse::new(loan, &book));
    BookResponse { book, active_loan }
}

pub async fn list_books(db: &DatabaseConnection, query: BookQuery) -> Result<Vec<BookResponse>, AppError> {
    let mut select = books::Entity::find();

    if let Some(term) = search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains(books::Column::Title, term))
                .add(icontains(books::Column::Author, term))
                .add(icontains(books::Column::BengaliTitle, term))
                .add(icontains(books::Column::SerialNumber, term))
                .add(icontains(books::Column::Category, term)),
        );
    }

    if let Some(category) = search_term(&query.category).filter(|c| *c != "All") {
        select = select.filter(books::Column::Category.eq(category));
    }

    match query.status.as_deref() {
        Some("available") => select = select.filter(books::Column::IsAvailable.eq(true)),
        Some("unavailable") => select = select.filter(books::Column::IsAvailable.eq(false)),
        _ => {}
    }

    let books = select.order_by_desc(books::Column::CreatedAt).all(db).await?;
    let mut latest = latest_active_loans(db, &books).await?;
    Ok(books
        .into_iter()
        .map(|book| with_active_loan(book, &mut latest))
        .collect())
}

pub async fn get_book(db: &DatabaseConnection, id: Uuid) -> Result<BookResponse, AppError> {
    let book = books::Entity::find_by_id(id).one(db).await?.ok_or_else(book_not_found)?;
    let mut latest = latest_active_loans(db, std::slice::from_ref(&book)).await?;
    Ok(with_active_loan(book, &mut latest))
}

pub async fn create_book(db: &DatabaseConnection, req: CreateBookRequest) -> Result<books::Model, AppError> {
    let serial = normalize_serial(&req.serial_number)?;
    ensure_serial_free(db, &serial, None).await?;

    let now = Utc::now().fixed_offset();
    let book = books::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(req.title),
        bengali_title: Set(req.bengali_title),
        author: Set(req.author),
        category: Set(req.category),
        serial_number: Set(serial),
        description: Set(req.description),
        cover_image: Set(req.cover_image),
        // 新书没有借阅
        is_available: Set(is_available(0, req.quantity)),
        quantity: Set(req.quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(map_serial_conflict)?;

    tracing::info!("📚 Book created: {} ({})", book.title, book.serial_number);
    Ok(book)
}

pub async fn update_book(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateBookRequest,
) -> Result<books::Model, AppError> {
    let serial = req.serial_number.as_deref().map(normalize_serial).transpose()?;

    let txn = db.begin().await?;
    let book = lock_book(&txn, id).await?;

    if let Some(serial) = &serial {
        ensure_serial_free(&txn, serial, Some(id)).await?;
    }

    let mut model: books::ActiveModel = book.into();
    if let Some(v) = req.title {
        model.title = Set(v);
    }
    if let Some(v) = req.bengali_title {
        model.bengali_title = Set(Some(v));
    }
    if let Some(v) = req.author {
        model.author = Set(v);
    }
    if let Some(v) = req.category {
        model.category = Set(v);
    }
    if let Some(v) = serial {
        model.serial_number = Set(v);
    }
    if let Some(v) = req.description {
        model.description = Set(v);
    }
    if let Some(v) = req.cover_image {
        model.cover_image = Set(Some(v));
    }
    if let Some(v) = req.quantity {
        model.quantity = Set(v);
    }
    model.updated_at = Set(Utc::now().fixed_offset());

    let updated = model.update(&txn).await.map_err(map_serial_conflict)?;
    let updated = recompute_availability(&txn, updated).await?;
    txn.commit().await?;
    Ok(updated)
}

/// 删除图书及其全部借阅记录
pub async fn delete_book(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let book = lock_book(&txn, id).await?;

    borrowed_books::Entity::delete_many()
        .filter(borrowed_books::Column::BookId.eq(book.id))
        .exec(&txn)
        .await?;
    books::Entity::delete_by_id(book.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!("🗑️ Book deleted: {}", book.serial_number);
    Ok(())
}

// ---------- 借阅 ----------

pub async fn list_loans(db: &DatabaseConnection, query: LoanQuery) -> Result<Vec<LoanResponse>, AppError> {
    let mut select = borrowed_books::Entity::find().find_also_related(books::Entity);

    match query.status.as_deref() {
        Some("returned") => select = select.filter(borrowed_books::Column::IsReturned.eq(true)),
        Some("borrowed") => select = select.filter(borrowed_books::Column::IsReturned.eq(false)),
        _ => {}
    }

    if let Some(term) = search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains((borrowed_books::Entity, borrowed_books::Column::BorrowerName), term))
                .add(icontains((books::Entity, books::Column::Title), term))
                .add(icontains((books::Entity, books::Column::SerialNumber), term)),
        );
    }

    let rows = select
        .order_by_desc(borrowed_books::Column::BorrowDate)
        .order_by_desc(borrowed_books::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(loan, book)| book.map(|book| LoanResponse::new(loan, &book)))
        .collect())
}

pub async fn get_loan(db: &DatabaseConnection, id: Uuid) -> Result<LoanResponse, AppError> {
    let (loan, book) = borrowed_books::Entity::find_by_id(id)
        .find_also_related(books::Entity)
        .one(db)
        .await?
        .ok_or_else(loan_not_found)?;
    let book = book.ok_or_else(book_not_found)?;
    Ok(LoanResponse::new(loan, &book))
}

fn check_dates(borrow: chrono::NaiveDate, due: chrono::NaiveDate) -> Result<(), AppError> {
    if due < borrow {
        return Err(AppError::invalid(
            "return_date",
            "Return date cannot be earlier than the borrow date.",
        ));
    }
    Ok(())
}

fn no_copies_left(book: &books::Model) -> AppError {
    tracing::warn!("📕 No free copy of {} ({})", book.title, book.serial_number);
    AppError::Conflict(format!("No copies of '{}' are available to borrow.", book.title))
}

/// 新建借阅。没有空闲副本时返回 Conflict。
pub async fn create_loan(db: &DatabaseConnection, req: CreateLoanRequest) -> Result<LoanResponse, AppError> {
    check_dates(req.borrow_date, req.return_date)?;

    let txn = db.begin().await?;
    let book = lock_book(&txn, req.book).await?;

    if !req.is_returned {
        let active = active_loans(&txn, book.id).await?;
        if !is_available(active, book.quantity) {
            return Err(no_copies_left(&book));
        }
    }

    let returned_date = if req.is_returned {
        Some(req.returned_date.unwrap_or_else(|| Utc::now().date_naive()))
    } else {
        None
    };

    let loan = borrowed_books::ActiveModel {
        id: Set(Uuid::new_v4()),
        book_id: Set(book.id),
        borrower_name: Set(req.borrower_name.trim().to_string()),
        borrow_date: Set(req.borrow_date),
        return_date: Set(req.return_date),
        is_returned: Set(req.is_returned),
        returned_date: Set(returned_date),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&txn)
    .await?;

    let book = recompute_availability(&txn, book).await?;
    txn.commit().await?;

    tracing::info!("📖 {} borrowed {}", loan.borrower_name, book.serial_number);
    Ok(LoanResponse::new(loan, &book))
}

/// 编辑借阅。可以换书（新旧两本都重算）；设为已归还等同于 mark_returned；
/// 已归还的记录不能重新打开。
pub async fn update_loan(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateLoanRequest,
) -> Result<LoanResponse, AppError> {
    let txn = db.begin().await?;

    let current = borrowed_books::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(loan_not_found)?;
    let old_book_id = current.book_id;
    let new_book_id = req.book.unwrap_or(old_book_id);

    // 固定加锁顺序，避免两个换书请求互相等待
    let mut lock_ids = vec![old_book_id, new_book_id];
    lock_ids.sort();
    lock_ids.dedup();
    let mut locked = HashMap::new();
    for book_id in lock_ids {
        locked.insert(book_id, lock_book(&txn, book_id).await?);
    }

    // 拿到锁之后重新读取，避免基于旧状态判断
    let loan = borrowed_books::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(loan_not_found)?;

    if loan.is_returned && req.is_returned == Some(false) {
        return Err(AppError::Conflict("A returned loan cannot be reopened.".to_string()));
    }

    let borrow_date = req.borrow_date.unwrap_or(loan.borrow_date);
    let return_date = req.return_date.unwrap_or(loan.return_date);
    check_dates(borrow_date, return_date)?;

    let returning = !loan.is_returned && req.is_returned == Some(true);
    let stays_out = !loan.is_returned && !returning;

    if stays_out && new_book_id != old_book_id {
        let target = &locked[&new_book_id];
        let active = active_loans(&txn, new_book_id).await?;
        if !is_available(active, target.quantity) {
            return Err(no_copies_left(target));
        }
    }

    let mut model: borrowed_books::ActiveModel = loan.into();
    model.book_id = Set(new_book_id);
    if let Some(name) = req.borrower_name {
        model.borrower_name = Set(name.trim().to_string());
    }
    model.borrow_date = Set(borrow_date);
    model.return_date = Set(return_date);
    if returning {
        model.is_returned = Set(true);
        model.returned_date = Set(Some(Utc::now().date_naive()));
    }
    let loan = model.update(&txn).await?;

    let mut response_book = None;
    for (book_id, book) in locked {
        let book = recompute_availability(&txn, book).await?;
        if book_id == new_book_id {
            response_book = Some(book);
        }
    }
    txn.commit().await?;

    let book = response_book.ok_or_else(book_not_found)?;
    Ok(LoanResponse::new(loan, &book))
}

pub async fn delete_loan(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let loan = borrowed_books::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(loan_not_found)?;
    let book = lock_book(&txn, loan.book_id).await?;

    borrowed_books::Entity::delete_by_id(loan.id).exec(&txn).await?;
    recompute_availability(&txn, book).await?;
    txn.commit().await?;
    Ok(())
}

/// 标记归还。重复归还返回 Conflict，记录保持不变。
pub async fn mark_returned(db: &DatabaseConnection, id: Uuid) -> Result<LoanResponse, AppError> {
    let txn = db.begin().await?;
    let loan = borrowed_books::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(loan_not_found)?;
    let book = lock_book(&txn, loan.book_id).await?;

    let loan = borrowed_books::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(loan_not_found)?;
    if loan.is_returned {
        return Err(AppError::Conflict("This book has already been returned.".to_string()));
    }

    let mut model: borrowed_books::ActiveModel = loan.into();
    model.is_returned = Set(true);
    model.returned_date = Set(Some(Utc::now().date_naive()));
    let loan = model.update(&txn).await?;

    let book = recompute_availability(&txn, book).await?;
    txn.commit().await?;

    tracing::info!("📗 {} returned {}", loan.borrower_name, book.serial_number);
    Ok(LoanResponse::new(loan, &book))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enums::BookCategory;
    use crate::testing::{seed_book, setup_db};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn loan_req(book: Uuid, borrower: &str) -> CreateLoanRequest {
        CreateLoanRequest {
            book,
            borrower_name: borrower.to_string(),
            borrow_date: day(1),
            return_date: day(15),
            is_returned: false,
            returned_date: None,
        }
    }

    async fn reload(db: &DatabaseConnection, id: Uuid) -> books::Model {
        books::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
    }

    /// 任何操作之后都必须成立
    async fn assert_invariant(db: &DatabaseConnection) {
        for book in books::Entity::find().all(db).await.unwrap() {
            let active = active_loans(db, book.id).await.unwrap();
            assert_eq!(
                book.is_available,
                is_available(active, book.quantity),
                "book {} has {} active loans, quantity {}",
                book.serial_number,
                active,
                book.quantity
            );
        }
    }

    #[test]
    fn availability_rule() {
        assert!(is_available(0, 1));
        assert!(!is_available(1, 1));
        assert!(is_available(1, 2));
        assert!(!is_available(0, 0));
    }

    #[tokio::test]
    async fn loans_consume_copies_until_none_left() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-001", 2).await;

        create_loan(&db, loan_req(book.id, "Rahim")).await.unwrap();
        assert!(reload(&db, book.id).await.is_available);

        create_loan(&db, loan_req(book.id, "Karim")).await.unwrap();
        assert!(!reload(&db, book.id).await.is_available);

        let third = create_loan(&db, loan_req(book.id, "Salma")).await;
        assert!(matches!(third, Err(AppError::Conflict(_))));
        assert_eq!(active_loans(&db, book.id).await.unwrap(), 2);
        assert_invariant(&db).await;
    }

    #[tokio::test]
    async fn mark_returned_twice_is_a_conflict_without_change() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-002", 1).await;
        let loan = create_loan(&db, loan_req(book.id, "Rahim")).await.unwrap();
        assert!(!reload(&db, book.id).await.is_available);

        let returned = mark_returned(&db, loan.id).await.unwrap();
        assert!(returned.is_returned);
        assert_eq!(returned.returned_date, Some(Utc::now().date_naive()));
        assert!(reload(&db, book.id).await.is_available);

        let before = borrowed_books::Entity::find_by_id(loan.id).one(&db).await.unwrap().unwrap();
        let again = mark_returned(&db, loan.id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        let after = borrowed_books::Entity::find_by_id(loan.id).one(&db).await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_invariant(&db).await;
    }

    #[tokio::test]
    async fn concurrent_loans_for_the_last_copy() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-003", 1).await;

        let (a, b) = tokio::join!(
            create_loan(&db, loan_req(book.id, "First")),
            create_loan(&db, loan_req(book.id, "Second")),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert!(matches!(a.err().or(b.err()), Some(AppError::Conflict(_))));
        assert!(!reload(&db, book.id).await.is_available);
        assert_eq!(active_loans(&db, book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn due_date_before_borrow_date_is_rejected() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-004", 1).await;
        let mut req = loan_req(book.id, "Rahim");
        req.return_date = day(1);
        req.borrow_date = day(5);

        let err = create_loan(&db, req).await.unwrap_err();
        assert!(matches!(err, AppError::Invalid { field: "return_date", .. }));
        assert!(reload(&db, book.id).await.is_available);
    }

    #[tokio::test]
    async fn creating_an_already_returned_loan_keeps_the_book_available() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-005", 1).await;
        let mut req = loan_req(book.id, "Historic");
        req.is_returned = true;

        let loan = create_loan(&db, req).await.unwrap();
        assert!(loan.returned_date.is_some());
        assert!(reload(&db, book.id).await.is_available);
    }

    #[tokio::test]
    async fn editing_a_loan_can_return_it_but_not_reopen_it() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-006", 1).await;
        let loan = create_loan(&db, loan_req(book.id, "Rahim")).await.unwrap();

        let returned = update_loan(
            &db,
            loan.id,
            UpdateLoanRequest { is_returned: Some(true), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(returned.is_returned);
        assert!(returned.returned_date.is_some());
        assert!(reload(&db, book.id).await.is_available);

        let reopen = update_loan(
            &db,
            loan.id,
            UpdateLoanRequest { is_returned: Some(false), ..Default::default() },
        )
        .await;
        assert!(matches!(reopen, Err(AppError::Conflict(_))));
        assert_invariant(&db).await;
    }

    #[tokio::test]
    async fn moving_a_loan_recomputes_both_books() {
        let db = setup_db().await;
        let first = seed_book(&db, "LIB-007", 1).await;
        let second = seed_book(&db, "LIB-008", 1).await;
        let loan = create_loan(&db, loan_req(first.id, "Rahim")).await.unwrap();
        assert!(!reload(&db, first.id).await.is_available);

        let moved = update_loan(
            &db,
            loan.id,
            UpdateLoanRequest { book: Some(second.id), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(moved.book, second.id);
        assert_eq!(moved.book_serial, "LIB-008");
        assert!(reload(&db, first.id).await.is_available);
        assert!(!reload(&db, second.id).await.is_available);

        // 第二本已借出，再把另一条借阅挪过去会冲突
        let other = create_loan(&db, loan_req(first.id, "Karim")).await.unwrap();
        let blocked = update_loan(
            &db,
            other.id,
            UpdateLoanRequest { book: Some(second.id), ..Default::default() },
        )
        .await;
        assert!(matches!(blocked, Err(AppError::Conflict(_))));
        assert_invariant(&db).await;
    }

    #[tokio::test]
    async fn quantity_changes_and_deletions_recompute() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-009", 1).await;
        let loan = create_loan(&db, loan_req(book.id, "Rahim")).await.unwrap();

        let bigger = update_book(
            &db,
            book.id,
            UpdateBookRequest { quantity: Some(2), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(bigger.is_available);

        let smaller = update_book(
            &db,
            book.id,
            UpdateBookRequest { quantity: Some(1), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(!smaller.is_available);

        delete_loan(&db, loan.id).await.unwrap();
        assert!(reload(&db, book.id).await.is_available);
        assert_invariant(&db).await;
    }

    #[tokio::test]
    async fn deleting_a_book_removes_its_loans() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-010", 3).await;
        create_loan(&db, loan_req(book.id, "A")).await.unwrap();
        create_loan(&db, loan_req(book.id, "B")).await.unwrap();

        delete_book(&db, book.id).await.unwrap();
        assert!(books::Entity::find_by_id(book.id).one(&db).await.unwrap().is_none());
        assert_eq!(borrowed_books::Entity::find().count(&db).await.unwrap(), 0);
        assert!(matches!(delete_book(&db, book.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn serial_numbers_are_unique() {
        let db = setup_db().await;
        seed_book(&db, "LIB-011", 1).await;
        let dup = create_book(
            &db,
            CreateBookRequest {
                title: "Gitanjali".into(),
                bengali_title: None,
                author: "Tagore".into(),
                category: BookCategory::Poetry,
                serial_number: "LIB-011".into(),
                description: String::new(),
                cover_image: None,
                quantity: 1,
            },
        )
        .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn blank_serial_numbers_are_rejected_after_trimming() {
        let db = setup_db().await;
        let book = seed_book(&db, "LIB-012", 1).await;
        let blank = create_book(
            &db,
            CreateBookRequest {
                title: "Sanchayita".into(),
                bengali_title: None,
                author: "Tagore".into(),
                category: BookCategory::Poetry,
                serial_number: "   ".into(),
                description: String::new(),
                cover_image: None,
                quantity: 1,
            },
        )
        .await;
        assert!(matches!(blank, Err(AppError::Invalid { field: "serial_number", .. })));

        let blank_edit = update_book(
            &db,
            book.id,
            UpdateBookRequest { serial_number: Some(" \t ".into()), ..Default::default() },
        )
        .await;
        assert!(matches!(blank_edit, Err(AppError::Invalid { field: "serial_number", .. })));
        assert_eq!(reload(&db, book.id).await.serial_number, "LIB-012");

        let trimmed = update_book(
            &db,
            book.id,
            UpdateBookRequest { serial_number: Some("  LIB-013 ".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(trimmed.serial_number, "LIB-013");
    }

    #[tokio::test]
    async fn listing_filters_and_active_loan() {
        let db = setup_db().await;
        let out = seed_book(&db, "LIB-012", 1).await;
        let shelf = seed_book(&db, "LIB-013", 1).await;
        create_loan(&db, loan_req(out.id, "Nasreen")).await.unwrap();

        let unavailable = list_books(
            &db,
            BookQuery { status: Some("unavailable".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(unavailable.len(), 1);
        assert_eq!(unavailable[0].book.id, out.id);
        assert_eq!(
            unavailable[0].active_loan.as_ref().map(|l| l.borrower_name.as_str()),
            Some("Nasreen")
        );

        let searched = list_books(
            &db,
            BookQuery { search: Some("lib-013".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].book.id, shelf.id);
        assert!(searched[0].active_loan.is_none());

        let all = list_books(
            &db,
            BookQuery { category: Some("All".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(all.len(), 2);

        let loans = list_loans(
            &db,
            LoanQuery { search: Some("nasr".into()), status: Some("borrowed".into()) },
        )
        .await
        .unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].book_title, out.title);

        let returned = list_loans(
            &db,
            LoanQuery { status: Some("returned".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(returned.is_empty());
    }
}
