// ap_demod - Amplitude demodulation via alternating projections
// Copyright (C) 2026 The ap_demod developers

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Error kinds of the demodulation engine and the process-wide
//! error-exit policy

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Error kinds reported by [`demodulate`](crate::demodulate).
///
/// Every kind carries a stable numeric code (see [`DemodError::code`])
/// that doubles as the process exit code when the exit-on-error policy
/// is active. The codes of conditions that cannot occur in safe Rust
/// (failed allocation, an out-of-range algorithm selector or break
/// flag) stay reserved and unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DemodError {
    /// The DFT descriptor could not be created for the requested grid.
    #[error("the DFT descriptor could not be created for the requested grid")]
    DftCreate,
    /// The DFT descriptor rejected a configuration value.
    #[error("the DFT descriptor rejected a configuration value")]
    DftSet,
    /// The working buffer does not match the committed DFT descriptor.
    #[error("the working buffer does not match the committed DFT descriptor")]
    DftCommit,
    /// A forward or backward DFT computation failed.
    #[error("a forward or backward DFT computation failed")]
    DftCompute,
    /// The signal dimension must be 1, 2, or 3.
    #[error("the signal dimension must be 1, 2, or 3")]
    BadDimension,
    /// Sampling frequencies must be positive finite numbers, one per dimension.
    #[error("sampling frequencies must be positive finite numbers, one per dimension")]
    BadFs,
    /// Cutoff frequencies must be positive finite numbers, one per dimension.
    #[error("cutoff frequencies must be positive finite numbers, one per dimension")]
    BadFc,
    /// Cutoff frequencies cannot exceed half of the sampling frequencies.
    #[error("cutoff frequencies cannot exceed half of the sampling frequencies")]
    BadFcRange,
    /// The infeasibility error tolerance must be a finite number.
    #[error("the infeasibility error tolerance must be a finite number")]
    BadEt,
    /// The iteration limit must be positive.
    #[error("the iteration limit must be positive")]
    BadNi,
    /// Signal sample counts must be greater than one in every dimension.
    #[error("signal sample counts must be greater than one in every dimension")]
    BadNs,
    /// Refined grid sizes must be greater than one in every dimension.
    #[error("refined grid sizes must be greater than one in every dimension")]
    BadNr,
    /// The compression exponent must be a finite number not smaller than one.
    #[error("the compression exponent must be a finite number not smaller than one")]
    BadCp,
    /// The error schedule must hold at least one entry and fit the output buffer.
    #[error("the error schedule must hold at least one entry and fit the output buffer")]
    BadIeCount,
    /// Error snapshot iterations must be strictly increasing.
    #[error("error snapshot iterations must be strictly increasing")]
    BadIeOrder,
    /// The modulator schedule must hold at least one entry and fit the output buffer.
    #[error("the modulator schedule must hold at least one entry and fit the output buffer")]
    BadImCount,
    /// Modulator snapshot iterations must be strictly increasing.
    #[error("modulator snapshot iterations must be strictly increasing")]
    BadImOrder,
    /// The signal must consist of finite values, one per sample point.
    #[error("the signal must consist of finite values, one per sample point")]
    BadSignal,
    /// The upper bound must be finite and dominate the absolute signal.
    #[error("the upper bound must be finite and dominate the absolute signal")]
    BadUpperBound,
    /// Sample coordinates must consist of finite values, one column per dimension.
    #[error("sample coordinates must consist of finite values, one column per dimension")]
    BadCoords,
}

impl DemodError {
    /// Stable numeric code of this error kind.
    pub fn code(self) -> i32 {
        match self {
            DemodError::DftCreate => 2,
            DemodError::DftSet => 3,
            DemodError::DftCommit => 4,
            DemodError::DftCompute => 5,
            DemodError::BadDimension => 7,
            DemodError::BadFs => 8,
            DemodError::BadFc => 9,
            DemodError::BadFcRange => 10,
            DemodError::BadEt => 11,
            DemodError::BadNi => 12,
            DemodError::BadNs => 13,
            DemodError::BadNr => 14,
            DemodError::BadCp => 15,
            DemodError::BadIeCount => 17,
            DemodError::BadIeOrder => 18,
            DemodError::BadImCount => 19,
            DemodError::BadImOrder => 20,
            DemodError::BadSignal => 21,
            DemodError::BadUpperBound => 22,
            DemodError::BadCoords => 23,
        }
    }
}

static EXIT_ON_ERROR: AtomicBool = AtomicBool::new(false);

/// Selects the behavior of [`demodulate`](crate::demodulate) upon an error.
///
/// With the policy disabled (the default) errors are returned to the
/// caller. With the policy enabled the engine additionally logs a
/// one-line description and terminates the process with
/// [`DemodError::code`] as the exit code.
pub fn set_exit_on_error(enabled: bool) {
    EXIT_ON_ERROR.store(enabled, Ordering::Relaxed);
}

pub(crate) fn exit_on_error() -> bool {
    EXIT_ON_ERROR.load(Ordering::Relaxed)
}
