// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CivicPay

//! Payout pipeline: synchronous reservation, asynchronous settlement.

pub mod executor;

pub use executor::{spawn_worker, PayoutError, PayoutExecutor, PayoutJob, DEFAULT_QUEUE_DEPTH};
