// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Code-hosting connector seam.
//!
//! Shipping through a proposal (`ship --pr N`) merges on the hosting
//! service instead of locally. No driver ships with this crate; embedders
//! pass their own [`Connector`] to the workflows.

use crate::error::Result;

/// Merges pull requests on a code-hosting service.
pub trait Connector {
    /// Human-readable service name for messages.
    fn name(&self) -> &str;

    /// Squash-merge pull request `number` (head `branch`, base `parent`)
    /// with `message` as the commit message.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the merge or cannot be reached.
    fn merge_pull_request(
        &self,
        branch: &str,
        parent: &str,
        number: u64,
        message: &str,
    ) -> Result<()>;
}
