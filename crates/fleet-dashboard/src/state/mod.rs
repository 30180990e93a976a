//! Session state shared by the loops and the API.

pub mod session;
pub mod store;

pub use session::{Banner, DashboardSession, DashboardView, DisplayMode, FeedItem, FlightsView, Panel};
pub use store::AppState;
