//! License creation and verification.
//!
//! Verification walks a fixed sequence of checks and stops at the first failure:
//! missing key, unknown key, deactivated, expired, hardware mismatch. A license
//! with no bound hardware identifier is bound to the presented one on its first
//! successful verification. The binding is a conditional update, so concurrent
//! verifications of the same unbound license cannot both bind it.

use chrono::{DateTime, Utc};

use crate::errors::{LicenseError, LicenseResult};
use crate::server::database::{Database, License};
use crate::server::logging::{log_license_binding_event, log_license_event, LicenseEvent};
use crate::server::validation::{validate_expiration, validate_license_key};
use crate::timestamp::is_expired;

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub license_key: String,
    /// Expiry exactly as stored.
    pub expires_at: Option<String>,
    /// Bound hardware identifier after this call.
    pub hwid: Option<String>,
    /// Whether this call performed the binding.
    pub newly_bound: bool,
}

/// Binding view of a license, with the time-derived overlays on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    Unbound,
    Bound,
    Expired,
    Deactivated,
}

impl License {
    /// Classify the license as `verify_license` would see it at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> LicenseState {
        if !self.active {
            LicenseState::Deactivated
        } else if is_expired(self.expires_at.as_deref(), now) {
            LicenseState::Expired
        } else if self.is_bound() {
            LicenseState::Bound
        } else {
            LicenseState::Unbound
        }
    }
}

/// Create a new license: unbound, active, expiring at `expires_at`.
///
/// Both inputs are required; `expires_at` must be a readable timestamp and is
/// stored verbatim.
pub async fn create_license(
    db: &Database,
    license_key: Option<&str>,
    expires_at: Option<&str>,
) -> LicenseResult<License> {
    let (license_key, expires_at) = match (license_key, expires_at) {
        (Some(k), Some(e)) if !k.is_empty() && !e.is_empty() => (k, e),
        _ => {
            return Err(LicenseError::Validation(
                "License key and expiration date required".to_string(),
            ))
        }
    };

    validate_license_key(license_key)?;
    validate_expiration(expires_at)?;

    let license = db.insert_license(license_key, expires_at).await?;
    log_license_event(LicenseEvent::Created, license_key, Some(expires_at));

    Ok(license)
}

/// Verify a license against the current wall-clock time.
pub async fn verify_license(
    db: &Database,
    license_key: Option<&str>,
    hwid: Option<&str>,
) -> LicenseResult<Verification> {
    verify_license_at(db, license_key, hwid, Utc::now()).await
}

/// Verify a license as of `now`, binding `hwid` if the license is unbound.
///
/// An absent or empty `hwid` is still written to an unbound license; the
/// license keeps reading as unbound afterwards.
pub async fn verify_license_at(
    db: &Database,
    license_key: Option<&str>,
    hwid: Option<&str>,
    now: DateTime<Utc>,
) -> LicenseResult<Verification> {
    let license_key = match license_key {
        Some(k) if !k.is_empty() => k,
        _ => return Err(LicenseError::Validation("License key is required".to_string())),
    };

    let result = check_and_bind(db, license_key, hwid, now).await;

    match &result {
        Ok(v) if v.newly_bound => {
            log_license_binding_event(LicenseEvent::Bound, license_key, hwid.unwrap_or(""));
        }
        Ok(_) => log_license_event(LicenseEvent::Validated, license_key, None),
        Err(e) if e.is_client_error() => {
            let reason = e.to_string();
            log_license_event(LicenseEvent::ValidationFailed, license_key, Some(&reason));
        }
        Err(_) => {}
    }

    result
}

async fn check_and_bind(
    db: &Database,
    license_key: &str,
    hwid: Option<&str>,
    now: DateTime<Utc>,
) -> LicenseResult<Verification> {
    let license = db
        .get_license_by_key(license_key)
        .await?
        .ok_or(LicenseError::NotFound)?;

    if !license.active {
        return Err(LicenseError::Deactivated);
    }

    if is_expired(license.expires_at.as_deref(), now) {
        return Err(LicenseError::Expired);
    }

    if let Some(bound) = license.bound_hwid() {
        return match_bound(&license, bound, hwid);
    }

    if db.bind_hwid(license_key, hwid).await? {
        return Ok(Verification {
            license_key: license.license_key,
            expires_at: license.expires_at,
            hwid: hwid.map(String::from),
            newly_bound: true,
        });
    }

    settle_lost_bind(db, license_key, hwid).await
}

/// Resolve a conditional bind that changed no row.
///
/// Another request bound the license between our read and our write, so the
/// outcome is decided against whatever identifier it wrote.
async fn settle_lost_bind(
    db: &Database,
    license_key: &str,
    hwid: Option<&str>,
) -> LicenseResult<Verification> {
    let current = db
        .get_license_by_key(license_key)
        .await?
        .ok_or(LicenseError::NotFound)?;

    match current.bound_hwid() {
        Some(bound) => match_bound(&current, bound, hwid),
        None => Err(LicenseError::Persistence(format!(
            "binding of license {license_key} did not take effect"
        ))),
    }
}

fn match_bound(license: &License, bound: &str, hwid: Option<&str>) -> LicenseResult<Verification> {
    if hwid != Some(bound) {
        return Err(LicenseError::HwidMismatch);
    }

    Ok(Verification {
        license_key: license.license_key.clone(),
        expires_at: license.expires_at.clone(),
        hwid: Some(bound.to_string()),
        newly_bound: false,
    })
}
