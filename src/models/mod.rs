mod account;
mod category;
mod ledger;
mod occurrence;
mod template;
mod user;

pub use account::{Account, AccountType};
pub use category::Category;
pub use ledger::{EntryKind, LedgerEntry, LedgerRef};
pub use occurrence::{Occurrence, OccurrenceStatus};
pub use template::RecurringTemplate;
pub use user::User;
