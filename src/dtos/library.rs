use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::enums::BookCategory;
use crate::entity::{books, borrowed_books};

// ---------- 图书 ----------

#[derive(Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 255))]
    pub bengali_title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    #[serde(default)]
    pub category: BookCategory,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: String,
    #[serde(default)]
    pub description: String,
    pub cover_image: Option<String>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// is_available 是派生字段，不接受客户端写入。
#[derive(Deserialize, Validate, Default)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub bengali_title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    pub category: Option<BookCategory>,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
}

#[derive(Deserialize, Default)]
pub struct BookQuery {
    pub search: Option<String>,
    /// `All` 表示不过滤
    pub category: Option<String>,
    /// `available` / `unavailable`
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: books::Model,
    /// 最近一条未归还的借阅
    pub active_loan: Option<LoanResponse>,
}

// ---------- 借阅 ----------

#[derive(Deserialize, Validate)]
pub struct CreateLoanRequest {
    pub book: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub borrower_name: String,
    pub borrow_date: NaiveDate,
    /// 应还日期
    pub return_date: NaiveDate,
    #[serde(default)]
    pub is_returned: bool,
    pub returned_date: Option<NaiveDate>,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateLoanRequest {
    pub book: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub borrower_name: Option<String>,
    pub borrow_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub is_returned: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct LoanQuery {
    pub search: Option<String>,
    /// `returned` / `borrowed`
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book: Uuid,
    pub book_title: String,
    pub book_serial: String,
    pub borrower_name: String,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
    pub is_returned: bool,
    pub returned_date: Option<NaiveDate>,
    pub created_at: String,
}

impl LoanResponse {
    pub fn new(loan: borrowed_books::Model, book: &books::Model) -> Self {
        Self {
            id: loan.id,
            book: loan.book_id,
            book_title: book.title.clone(),
            book_serial: book.serial_number.clone(),
            borrower_name: loan.borrower_name,
            borrow_date: loan.borrow_date,
            return_date: loan.return_date,
            is_returned: loan.is_returned,
            returned_date: loan.returned_date,
            created_at: loan.created_at.to_rfc3339(),
        }
    }
}
