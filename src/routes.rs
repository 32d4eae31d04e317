use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

// 重命名为 app_middleware，避免与 axum::middleware 冲突
use crate::{handlers, middleware as app_middleware, state::AppState};

/// 创建应用路由。
///
/// # 路由结构
/// 1. `/auth/*`：注册、登录、令牌、邮箱验证、密码、本人资料；`/auth/manage` 仅管理员，
///    `/auth/dashboard/stats` 仅运营人员（Admin / Staff）。
/// 2. `/library/*`、`/blog/posts`、`/core/{notices,members,carousel}`、`/health/camps`：
///    公开只读，写操作需要运营人员。
/// 3. `/blog/comments`：公开只读，登录即可写；修改删除另有归属检查。
/// 4. `/core/contact`：提交公开（人机校验），其余操作仅运营人员。
///
/// # 中间件
/// - 全局：令牌黑名单检查、请求日志、CORS。
/// - 分组：`route_layer` 挂角色守卫，只作用于其之前注册的路由。
pub fn create_router(state: AppState) -> Router {
    let operator_or_read_only =
        || middleware::from_fn_with_state(state.clone(), app_middleware::auth::operator_or_read_only);
    let operator_only = || middleware::from_fn_with_state(state.clone(), app_middleware::auth::operator_guard);

    // --- 认证与账号 ---
    // me / change-password 由 Claims 提取器要求登录
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/register/staff", post(handlers::auth::register_staff))
        .route("/login", post(handlers::auth::login))
        .route("/token/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/verify-email", post(handlers::auth::verify_email))
        .route("/resend-verification", post(handlers::auth::resend_verification))
        .route("/change-password", patch(handlers::auth::change_password))
        .route("/password-reset", post(handlers::auth::password_reset))
        .route("/password-reset-confirm", patch(handlers::auth::password_reset_confirm))
        .route(
            "/me",
            get(handlers::users::get_me)
                .patch(handlers::users::update_me)
                .put(handlers::users::update_me),
        );

    let manage_routes = Router::new()
        .route("/manage", get(handlers::users::list_users))
        .route(
            "/manage/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/manage/{id}/toggle-staff", post(handlers::users::toggle_staff))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::admin_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/dashboard/stats", get(handlers::users::dashboard_stats))
        .route_layer(operator_only());

    // --- 图书馆 ---
    let library_routes = Router::new()
        .route(
            "/books",
            get(handlers::library::list_books).post(handlers::library::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::library::get_book)
                .patch(handlers::library::update_book)
                .put(handlers::library::update_book)
                .delete(handlers::library::delete_book),
        )
        .route(
            "/borrowed-books",
            get(handlers::library::list_loans).post(handlers::library::create_loan),
        )
        .route(
            "/borrowed-books/{id}",
            get(handlers::library::get_loan)
                .patch(handlers::library::update_loan)
                .put(handlers::library::update_loan)
                .delete(handlers::library::delete_loan),
        )
        .route("/borrowed-books/{id}/mark_returned", post(handlers::library::mark_returned))
        .route_layer(operator_or_read_only());

    // --- 博客 ---
    let comment_routes = Router::new()
        .route(
            "/comments",
            get(handlers::blog::list_comments).post(handlers::blog::create_comment),
        )
        .route(
            "/comments/{id}",
            get(handlers::blog::get_comment)
                .patch(handlers::blog::update_comment)
                .put(handlers::blog::update_comment)
                .delete(handlers::blog::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::authenticated_or_read_only,
        ));

    let blog_routes = Router::new()
        .route(
            "/posts",
            get(handlers::blog::list_posts).post(handlers::blog::create_post),
        )
        .route(
            "/posts/{id}",
            get(handlers::blog::get_post)
                .patch(handlers::blog::update_post)
                .put(handlers::blog::update_post)
                .delete(handlers::blog::delete_post),
        )
        .route_layer(operator_or_read_only())
        // 在 route_layer 之后注册：阅读计数对所有人开放
        .route("/posts/{id}/increment_read", post(handlers::blog::increment_read))
        .merge(comment_routes);

    // --- 站点内容 ---
    let core_routes = Router::new()
        .route(
            "/notices",
            get(handlers::content::list_notices).post(handlers::content::create_notice),
        )
        .route(
            "/notices/{id}",
            get(handlers::content::get_notice)
                .patch(handlers::content::update_notice)
                .put(handlers::content::update_notice)
                .delete(handlers::content::delete_notice),
        )
        .route(
            "/members",
            get(handlers::content::list_members).post(handlers::content::create_member),
        )
        .route(
            "/members/{id}",
            get(handlers::content::get_member)
                .patch(handlers::content::update_member)
                .put(handlers::content::update_member)
                .delete(handlers::content::delete_member),
        )
        .route(
            "/carousel",
            get(handlers::content::list_carousel).post(handlers::content::create_carousel_item),
        )
        .route(
            "/carousel/{id}",
            get(handlers::content::get_carousel_item)
                .patch(handlers::content::update_carousel_item)
                .put(handlers::content::update_carousel_item)
                .delete(handlers::content::delete_carousel_item),
        )
        .route_layer(operator_or_read_only())
        // 联系表单：POST 公开，其余方法单独挂运营人员守卫
        .route(
            "/contact",
            post(handlers::content::submit_contact)
                .merge(get(handlers::content::list_contacts).route_layer(operator_only())),
        )
        .route(
            "/contact/{id}",
            get(handlers::content::get_contact)
                .patch(handlers::content::update_contact)
                .delete(handlers::content::delete_contact)
                .route_layer(operator_only()),
        );

    // --- 义诊 ---
    let health_routes = Router::new()
        .route(
            "/camps",
            get(handlers::health::list_camps).post(handlers::health::create_camp),
        )
        .route(
            "/camps/{id}",
            get(handlers::health::get_camp)
                .patch(handlers::health::update_camp)
                .put(handlers::health::update_camp)
                .delete(handlers::health::delete_camp),
        )
        .route_layer(operator_or_read_only());

    // --- 路由组合 ---
    Router::new()
        .route("/", get(|| async { "🚀 Foundation portal is running!" }))
        .nest("/auth", auth_routes.merge(manage_routes).merge(dashboard_routes))
        .nest("/library", library_routes)
        .nest("/blog", blog_routes)
        .nest("/core", core_routes)
        .nest("/health", health_routes)
        // 全局：已注销的令牌在任何路由上都被拒绝
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::auth_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        core::enums::UserRole,
        dtos::blog::CreatePostRequest,
        services::blog,
        testing::{recording_email, setup_db, test_state, RecordingTransport, UserSeed},
    };

    async fn app() -> (Router, AppState) {
        let db = setup_db().await;
        let state = test_state(db, recording_email(false, Arc::new(RecordingTransport::default())));
        (create_router(state.clone()), state)
    }

    /// 匿名请求（不带令牌，不会触及 Redis）
    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn contact_submission_is_public_but_needs_a_recaptcha_token() {
        let (app, _) = app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/core/contact",
            Some(json!({
                "name": "Rahim",
                "email": "rahim@example.org",
                "subject": "Books",
                "message": "Can I donate?"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["data"]["recaptcha"][0], "No reCAPTCHA token provided");
    }

    #[tokio::test]
    async fn contact_review_is_operator_only() {
        let (app, _) = app().await;
        let item = format!("/core/contact/{}", Uuid::new_v4());

        assert_eq!(call(&app, Method::GET, "/core/contact", None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&app, Method::GET, &item, None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(&app, Method::PATCH, &item, Some(json!({ "is_read": true }))).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(call(&app, Method::DELETE, &item, None).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn read_counter_stays_public_while_posts_are_guarded() {
        let (app, state) = app().await;
        let author = UserSeed::new("staff@example.org", UserRole::Staff).insert(&state.db).await;
        let post = blog::create_post(
            &state.db,
            author.id,
            CreatePostRequest {
                title: "Winter clothes drive".into(),
                content: "Thanks to everyone who helped.".into(),
                author_name: String::new(),
                image: None,
            },
        )
        .await
        .unwrap();

        let (status, body) =
            call(&app, Method::POST, &format!("/blog/posts/{}/increment_read", post.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["read_count"], 1);

        assert_eq!(call(&app, Method::GET, "/blog/posts", None).await.0, StatusCode::OK);
        assert_eq!(
            call(&app, Method::POST, "/blog/posts", Some(json!({ "title": "x", "content": "y" }))).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(&app, Method::DELETE, &format!("/blog/posts/{}", post.id), None).await.0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn management_routes_reject_anonymous_callers() {
        let (app, _) = app().await;
        assert_eq!(call(&app, Method::GET, "/auth/manage", None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&app, Method::GET, "/auth/dashboard/stats", None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&app, Method::GET, "/library/books", None).await.0, StatusCode::OK);
    }
}
