//! Client core for the risk-limiting audit county and state dashboards: the
//! ballot audit wizard, dashboard state reconciliation, and the request
//! lifecycle that feeds both.

pub mod action;
pub mod adapter;
pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod merge;
pub mod reactions;
pub mod route;
pub mod selectors;
pub mod state;
pub mod store;
pub mod wizard;

pub use action::{Action, ActionName, ActionPhase};
pub use client::{DashboardRefresher, RefreshOutcome, RefreshTicket, RlaClient, SubmitOutcome};
pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, WizardError};
pub use merge::{merge, DashboardStateMerger};
pub use route::{BoardRouteLocator, NoRoute, StaticRoute};
pub use state::{CountyDashboardState, ServerRefreshPayload};
pub use store::{CountyStore, StoreEvent};
pub use wizard::{Viewport, WizardController, WizardStage};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Action(Action),
    Notice(String),
}
