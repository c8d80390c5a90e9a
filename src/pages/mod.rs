//! Page controllers: sign-in, list controllers for employees, plans, price
//! lists and the quote history, plus the read-only price view.

pub mod employees;
pub mod listing;
pub mod login;
pub mod plans;
pub mod price_view;
pub mod prices;
pub mod quotes;

pub use employees::{EmployeeAction, EmployeesPage, StatusFilter};
pub use listing::{Confirmation, ListController, ListPage, ListRow, Refusal, RowSnapshot};
pub use login::LoginPage;
pub use plans::{PlanAction, PlansPage};
pub use price_view::PriceViewPage;
pub use prices::{PriceAction, PricesPage, PRICE_LIST_CHANNELS};
pub use quotes::{QuoteAction, QuoteHistoryPage};
