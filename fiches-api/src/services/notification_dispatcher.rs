//! Notification Dispatcher
//!
//! Decides which mail, if any, a sheet creation or status change calls for,
//! resolves the recipients' emails and hands one mail per recipient to the
//! mailer.

use std::collections::HashSet;
use std::sync::Arc;

use fiches_core::{
    Collection, FichesError, FichesResult, MailTemplate, Sheet, SheetCircuit, SheetStatus,
    TeacherUser, UserId,
};
use fiches_mail::{MailRequest, Mailer};
use fiches_storage::{DocumentStore, Query};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::USER_UID_FIELD;
use crate::telemetry::metrics::with_metrics;

// ============================================================================
// DISPATCH POLICY
// ============================================================================

/// A mail to send and the role whose members receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice<'a> {
    pub template: MailTemplate,
    pub recipients: &'a [UserId],
}

/// Status transition that triggers a mail: entering `target` from any other
/// status sends `template` to the users returned by `recipients`.
pub struct TransitionRule {
    pub target: SheetStatus,
    pub template: MailTemplate,
    pub recipients: fn(&Sheet) -> &[UserId],
}

impl TransitionRule {
    fn matches(&self, before: &Sheet, after: &Sheet) -> bool {
        before.status.as_ref() != Some(&self.target) && after.status.as_ref() == Some(&self.target)
    }
}

fn teachers(sheet: &Sheet) -> &[UserId] {
    &sheet.teacher
}

fn sheet_makers(sheet: &Sheet) -> &[UserId] {
    &sheet.sheet_maker
}

/// Update rules in priority order; the first match wins.
pub static UPDATE_RULES: [TransitionRule; 3] = [
    TransitionRule {
        target: SheetStatus::Transcripted,
        template: MailTemplate::MapCreation,
        recipients: teachers,
    },
    TransitionRule {
        target: SheetStatus::Mapped,
        template: MailTemplate::SheetCreation,
        recipients: sheet_makers,
    },
    TransitionRule {
        target: SheetStatus::SheetDone,
        template: MailTemplate::ValidationCreation,
        recipients: teachers,
    },
];

/// Mail due when a sheet is created.
///
/// Only finished sheets on a known circuit notify anyone.
pub fn creation_notice(sheet: &Sheet) -> Option<Notice<'_>> {
    if !sheet.finished {
        return None;
    }
    match sheet.circuit.as_ref()? {
        SheetCircuit::Long => Some(Notice {
            template: MailTemplate::TranscriptionCreation,
            recipients: &sheet.transcripter,
        }),
        SheetCircuit::Short => Some(Notice {
            template: MailTemplate::SheetCreation,
            recipients: &sheet.sheet_maker,
        }),
        SheetCircuit::Other(_) => None,
    }
}

/// Mail due when a sheet changes from `before` to `after`.
///
/// Recipients are always read from `after`.
pub fn update_notice<'a>(before: &Sheet, after: &'a Sheet) -> Option<Notice<'a>> {
    UPDATE_RULES
        .iter()
        .find(|rule| rule.matches(before, after))
        .map(|rule| Notice {
            template: rule.template,
            recipients: (rule.recipients)(after),
        })
}

// ============================================================================
// REPORT
// ============================================================================

/// Outcome of one notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub template_id: String,
    /// Distinct user ids asked for
    pub requested: usize,
    /// Users found in the store with a usable email
    pub resolved: usize,
    pub sent: usize,
    pub failed: usize,
}

impl NotificationReport {
    fn empty(template: MailTemplate) -> Self {
        Self {
            template_id: template.template_id().to_string(),
            requested: 0,
            resolved: 0,
            sent: 0,
            failed: 0,
        }
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Sends workflow notification mails for sheet lifecycle changes.
pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    sheet_base_url: String,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        sheet_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            sheet_base_url: sheet_base_url.into(),
        }
    }

    /// Link to the sheet's page, put in every mail.
    pub fn button_url(&self, sheet_id: &str) -> String {
        format!("{}{}", self.sheet_base_url, sheet_id)
    }

    /// React to a new sheet. Returns `None` when no mail was due or the
    /// fan-out could not start.
    pub async fn process_sheet_created(&self, sheet: &Sheet) -> Option<NotificationReport> {
        let Some(notice) = creation_notice(sheet) else {
            tracing::debug!(sheet_id = %sheet.id, "No notification due on creation");
            return None;
        };
        self.send_sheet_notification(notice.template, notice.recipients, sheet)
            .await
    }

    /// React to a sheet update. At most one template is sent per call.
    pub async fn process_sheet_updated(
        &self,
        before: &Sheet,
        after: &Sheet,
    ) -> Option<NotificationReport> {
        let Some(notice) = update_notice(before, after) else {
            tracing::debug!(sheet_id = %after.id, "No notification due on update");
            return None;
        };
        self.send_sheet_notification(notice.template, notice.recipients, after)
            .await
    }

    /// Look the users up and mail each of them. Errors are logged, never
    /// returned.
    pub async fn send_sheet_notification(
        &self,
        template: MailTemplate,
        user_ids: &[UserId],
        sheet: &Sheet,
    ) -> Option<NotificationReport> {
        match self.try_send(template, user_ids, sheet).await {
            Ok(report) => {
                tracing::info!(
                    template_id = %report.template_id,
                    sheet_id = %sheet.id,
                    requested = report.requested,
                    resolved = report.resolved,
                    sent = report.sent,
                    failed = report.failed,
                    "Sheet notification dispatched"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(
                    error.kind = e.kind(),
                    error.message = %e,
                    template_id = template.template_id(),
                    sheet_id = %sheet.id,
                    "Sheet notification failed"
                );
                None
            }
        }
    }

    async fn try_send(
        &self,
        template: MailTemplate,
        user_ids: &[UserId],
        sheet: &Sheet,
    ) -> FichesResult<NotificationReport> {
        let mut seen = HashSet::new();
        let ids: Vec<&str> = user_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut report = NotificationReport::empty(template);
        report.requested = ids.len();
        if ids.is_empty() {
            tracing::warn!(
                template_id = template.template_id(),
                sheet_id = %sheet.id,
                "No recipients assigned, nothing to send"
            );
            return Ok(report);
        }

        let documents = self
            .store
            .query(Collection::Users, &Query::one_of(USER_UID_FIELD, ids))
            .await?;

        let mut users = Vec::with_capacity(documents.len());
        for document in &documents {
            match document.decode::<TeacherUser>() {
                Ok(user) if !user.email.trim().is_empty() => users.push(user),
                Ok(user) => {
                    tracing::warn!(uid = %user.uid, "User has no email, skipping");
                    report.failed += 1;
                }
                Err(e) => {
                    log_recipient_failure(template, &document.id, &e);
                    report.failed += 1;
                }
            }
        }
        report.resolved = users.len();

        let data = json!({
            "course": sheet.course,
            "chapter": sheet.chapter,
            "buttonUrl": self.button_url(&sheet.id),
        });

        let sends = users.iter().map(|user| {
            let request =
                MailRequest::new(template.template_id(), vec![user.email.clone()], data.clone());
            async move { (user, self.mailer.send_mail(&request).await) }
        });

        for (user, result) in join_all(sends).await {
            let success = result.is_ok();
            with_metrics(|metrics| metrics.record_mail_send(template.template_id(), success));
            match result {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log_recipient_failure(template, &user.uid, &e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn log_recipient_failure(template: MailTemplate, uid: &str, error: &FichesError) {
    tracing::error!(
        error.kind = error.kind(),
        error.message = %error,
        template_id = template.template_id(),
        uid = %uid,
        "Notification to recipient failed"
    );
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
