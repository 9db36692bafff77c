pub mod assignment_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod patient_dao;
pub mod room_dao;
pub mod staff_dao;
pub mod token_dao;
pub mod user_dao;

pub use assignment_dao::AssignmentDao;
pub use base::DaoBase;
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use patient_dao::{PatientDao, PatientFilter};
pub use room_dao::{RoomDao, RoomFilter};
pub use staff_dao::StaffDao;
pub use token_dao::TokenDao;
pub use user_dao::{UserDao, UserFilter};

use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition};

/// Case-insensitive substring match across `columns`. `%` and `_` in the
/// needle match literally. Case folding is ASCII only, matching SQLite's
/// `lower()`.
pub(crate) fn contains_any<C>(columns: &[C], needle: &str) -> Condition
where
    C: ColumnTrait,
{
    let pattern = like_pattern(needle);
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::lower(Expr::col(*column)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}

fn like_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(&needle.to_ascii_lowercase()))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
