//! Engines that change state on disk and then publish it.
//!
//! Every engine holds a [`Repository`](crate::repository::Repository) for
//! persistence and a [`StateStore`](crate::state::StateStore) for the
//! in-memory view. The rule is the same everywhere: the filesystem operation
//! must succeed before the store is updated, so the two never diverge.
//!
//! # Components
//!
//! - [`ModToggleService`]: enable/disable a mod or agent by renaming its jar
//! - [`ProfileActivation`]: apply a saved mod profile with the fewest toggles
//! - [`ProfileService`]: create, save and delete profiles
//! - [`ProcessHistoryTracker`]: record newly seen game processes
//! - [`UpdateService`]: check, download and install the loader
//!
//! Collaborators are traits so they can be swapped in tests:
//! [`ReleaseSource`], [`IntegrityChecker`], [`ProcessEnumerator`] and
//! [`ManifestReader`](crate::repository::ManifestReader).

pub mod activation;
pub mod history;
pub mod integrity;
pub mod profiles;
pub mod release;
pub mod toggle;
pub mod update;

pub use activation::{ActivationFailure, ActivationReport, ProfileActivation};
pub use history::{ProcessEnumerator, ProcessHistoryTracker};
pub use integrity::{IntegrityChecker, Sha256Integrity};
pub use profiles::ProfileService;
pub use release::{GithubReleaseSource, Release, ReleaseAsset, ReleaseSource};
pub use toggle::ModToggleService;
pub use update::{LoaderUpdate, UpdateService};
