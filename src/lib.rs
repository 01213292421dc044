//! revwatch library crate: polls GitHub for pull requests awaiting review.
//!
//! A [`Scheduler`] drives a [`ReviewChecker`] on a fixed interval. Each cycle
//! fetches open pull requests through a [`github::ReviewGateway`], reconciles
//! them against locally persisted dismissed and notified ids, sends
//! notifications for new review requests, and records a [`PrCheckResult`].
//! Tokens come from configuration, the local secret store, or the OAuth
//! device flow in [`auth`].

pub mod auth;
pub mod checker;
pub mod config;
pub mod error;
pub mod github;
pub mod notify;
pub mod persistence;
pub mod reconcile;
pub mod scheduler;

pub use checker::{CheckerSettings, ReviewChecker, apply_stored_dismissal};
pub use config::{OperationMode, RevwatchConfig, TokenSource};
pub use error::RevwatchError;
pub use github::{
    BearerToken, CheckError, CheckErrorKind, OctocrabReviewGateway, PullRequest, RepositorySlug,
    ReviewGateway, ReviewState,
};
pub use reconcile::{NotificationPlan, PrCheckResult, TrackedIds, reconcile};
pub use scheduler::{CheckInterval, CycleRunner, Scheduler};
