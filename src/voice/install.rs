//! Per-language voice-pack install lifecycle.
//!
//! The backend reports raw status codes; this module maps them onto
//! [`VoiceInstallStatus`] and decides when to ask for an install and when to
//! tell the user something changed. Nothing here performs I/O: callers get a
//! list of [`VoicePackEffect`]s to carry out.

use super::language::VoicePackLanguage;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VoiceInstallStatus {
    #[default]
    None,
    Exists,
    Installing,
    Downloaded,
    Installed,
    RemovedByUser,
    InstallError,
}

impl VoiceInstallStatus {
    pub fn is_installed(self) -> bool {
        matches!(
            self,
            VoiceInstallStatus::Downloaded | VoiceInstallStatus::Installed
        )
    }
}

/// Raw status codes reported by the install backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoicePackStatusCode {
    NotInstalled,
    Installing,
    Installed,
    Other(String),
}

impl VoicePackStatusCode {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "kNotInstalled" => VoicePackStatusCode::NotInstalled,
            "kInstalling" => VoicePackStatusCode::Installing,
            "kInstalled" => VoicePackStatusCode::Installed,
            other => VoicePackStatusCode::Other(other.to_string()),
        }
    }

    /// Fixed backend mapping; anything unrecognised is an install error.
    pub fn to_status(&self) -> VoiceInstallStatus {
        match self {
            VoicePackStatusCode::NotInstalled => VoiceInstallStatus::Exists,
            VoicePackStatusCode::Installing => VoiceInstallStatus::Installing,
            VoicePackStatusCode::Installed => VoiceInstallStatus::Downloaded,
            VoicePackStatusCode::Other(_) => VoiceInstallStatus::InstallError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VoiceNotification {
    Downloading,
    Downloaded,
    InstallError,
    RemovedByUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoicePackEffect {
    RequestInstall(VoicePackLanguage),
    Notify {
        language: VoicePackLanguage,
        notification: VoiceNotification,
    },
}

#[derive(Debug, Default)]
pub struct VoiceInstallTracker {
    statuses: HashMap<VoicePackLanguage, VoiceInstallStatus>,
}

impl VoiceInstallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for any language tag; unsupported languages are always `None`.
    pub fn status(&self, lang_or_locale: &str) -> VoiceInstallStatus {
        VoicePackLanguage::canonicalize(lang_or_locale)
            .and_then(|lang| self.statuses.get(&lang).copied())
            .unwrap_or_default()
    }

    /// Apply a backend report for `lang_or_locale`.
    pub fn on_status(&mut self, lang_or_locale: &str, code: &str) -> Vec<VoicePackEffect> {
        let Some(language) = VoicePackLanguage::canonicalize(lang_or_locale) else {
            debug!(lang_or_locale, code, "Ignoring status for unsupported voice language");
            return Vec::new();
        };
        let code = VoicePackStatusCode::parse(code);
        let previous = self.statuses.get(&language).copied().unwrap_or_default();
        let (next, effects) = transition(&language, previous, &code);
        if next != previous {
            info!(
                language = %language,
                from = ?previous,
                to = ?next,
                "Voice pack status changed"
            );
        }
        if let VoicePackStatusCode::Other(raw) = &code {
            warn!(language = %language, code = %raw, "Voice pack install failed");
        }
        self.statuses.insert(language, next);
        effects
    }

    /// Explicit install request, the only way out of `InstallError`.
    pub fn request_install(&mut self, lang_or_locale: &str) -> Vec<VoicePackEffect> {
        let Some(language) = VoicePackLanguage::canonicalize(lang_or_locale) else {
            return Vec::new();
        };
        let previous = self.statuses.get(&language).copied().unwrap_or_default();
        if previous.is_installed() || previous == VoiceInstallStatus::Installing {
            debug!(language = %language, status = ?previous, "Install already satisfied");
            return Vec::new();
        }
        info!(language = %language, "Requesting voice pack install");
        self.statuses
            .insert(language.clone(), VoiceInstallStatus::Installing);
        install_effects(language)
    }
}

fn install_effects(language: VoicePackLanguage) -> Vec<VoicePackEffect> {
    vec![
        VoicePackEffect::RequestInstall(language.clone()),
        VoicePackEffect::Notify {
            language,
            notification: VoiceNotification::Downloading,
        },
    ]
}

fn notify(language: &VoicePackLanguage, notification: VoiceNotification) -> Vec<VoicePackEffect> {
    vec![VoicePackEffect::Notify {
        language: language.clone(),
        notification,
    }]
}

fn transition(
    language: &VoicePackLanguage,
    previous: VoiceInstallStatus,
    code: &VoicePackStatusCode,
) -> (VoiceInstallStatus, Vec<VoicePackEffect>) {
    use VoiceInstallStatus as S;
    match (previous, code.to_status()) {
        // First sighting of a missing pack: ask for it once.
        (S::None, S::Exists) => (S::Installing, install_effects(language.clone())),
        (S::Downloaded | S::Installed | S::RemovedByUser, S::Exists) => (
            S::RemovedByUser,
            if previous == S::RemovedByUser {
                Vec::new()
            } else {
                notify(language, VoiceNotification::RemovedByUser)
            },
        ),
        // Still installing, or a retry is up to the user.
        (S::Installing, S::Exists) => (S::Installing, Vec::new()),
        (_, S::Exists) => (S::Exists, Vec::new()),
        (S::Installing, S::Downloaded) => {
            (S::Downloaded, notify(language, VoiceNotification::Downloaded))
        }
        (S::Downloaded, S::Downloaded) => (S::Downloaded, Vec::new()),
        (_, S::Downloaded) => (S::Installed, Vec::new()),
        (S::InstallError, S::InstallError) => (S::InstallError, Vec::new()),
        (_, S::InstallError) => (
            S::InstallError,
            notify(language, VoiceNotification::InstallError),
        ),
        (_, next) => (next, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(tag: &str) -> VoicePackLanguage {
        VoicePackLanguage::canonicalize(tag).unwrap()
    }

    #[test]
    fn status_codes_use_fixed_mapping() {
        assert_eq!(
            VoicePackStatusCode::parse("kNotInstalled").to_status(),
            VoiceInstallStatus::Exists
        );
        assert_eq!(
            VoicePackStatusCode::parse("kInstalled").to_status(),
            VoiceInstallStatus::Downloaded
        );
        assert_eq!(
            VoicePackStatusCode::parse("kInstalling").to_status(),
            VoiceInstallStatus::Installing
        );
        assert_eq!(
            VoicePackStatusCode::parse("kOther").to_status(),
            VoiceInstallStatus::InstallError
        );
    }

    #[test]
    fn first_missing_report_requests_install_once() {
        let mut tracker = VoiceInstallTracker::new();
        let effects = tracker.on_status("fr-FR", "kNotInstalled");
        assert_eq!(
            effects,
            vec![
                VoicePackEffect::RequestInstall(lang("fr")),
                VoicePackEffect::Notify {
                    language: lang("fr"),
                    notification: VoiceNotification::Downloading
                },
            ]
        );
        assert_eq!(tracker.status("fr"), VoiceInstallStatus::Installing);
        assert!(tracker.on_status("fr", "kNotInstalled").is_empty());

        let effects = tracker.on_status("fr", "kInstalled");
        assert_eq!(
            effects,
            vec![VoicePackEffect::Notify {
                language: lang("fr"),
                notification: VoiceNotification::Downloaded
            }]
        );
        assert_eq!(tracker.status("fr-CA"), VoiceInstallStatus::Downloaded);
    }

    #[test]
    fn already_present_pack_is_installed_silently() {
        let mut tracker = VoiceInstallTracker::new();
        assert!(tracker.on_status("de", "kInstalled").is_empty());
        assert_eq!(tracker.status("de"), VoiceInstallStatus::Installed);
    }

    #[test]
    fn removal_after_install_is_reported() {
        let mut tracker = VoiceInstallTracker::new();
        tracker.on_status("it", "kInstalled");
        let effects = tracker.on_status("it", "kNotInstalled");
        assert_eq!(
            effects,
            vec![VoicePackEffect::Notify {
                language: lang("it"),
                notification: VoiceNotification::RemovedByUser
            }]
        );
        assert_eq!(tracker.status("it"), VoiceInstallStatus::RemovedByUser);
        assert!(tracker.on_status("it", "kNotInstalled").is_empty());
    }

    #[test]
    fn errors_are_not_retried_automatically() {
        let mut tracker = VoiceInstallTracker::new();
        tracker.on_status("ja", "kNotInstalled");
        let effects = tracker.on_status("ja", "kErrorNetwork");
        assert_eq!(
            effects,
            vec![VoicePackEffect::Notify {
                language: lang("ja"),
                notification: VoiceNotification::InstallError
            }]
        );
        assert!(tracker.on_status("ja", "kNotInstalled").is_empty());
        assert_eq!(tracker.status("ja"), VoiceInstallStatus::Exists);

        let retry = tracker.request_install("ja");
        assert_eq!(retry[0], VoicePackEffect::RequestInstall(lang("ja")));
        assert_eq!(tracker.status("ja"), VoiceInstallStatus::Installing);
    }

    #[test]
    fn unsupported_languages_stay_none() {
        let mut tracker = VoiceInstallTracker::new();
        assert!(tracker.on_status("cn", "kNotInstalled").is_empty());
        assert!(tracker.request_install("cn").is_empty());
        assert_eq!(tracker.status("cn"), VoiceInstallStatus::None);
    }
}
