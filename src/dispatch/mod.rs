//! Dispatch notices sent to the responsible authority
//!
//! Renders the notification email for a filed complaint as plain text and as
//! an RFC 5322 `.eml` message, plus the ordered steps of the dispatch log.

use crate::config::DispatchConfig;
use crate::intake::FiledComplaint;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const FALLBACK_FILER: &str = "Citizen";
const FALLBACK_FILER_EMAIL: &str = "citizen@example.com";

/// One line of the dispatch log, shown `offset_ms` after dispatch starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStep {
    pub offset_ms: u64,
    pub text: String,
}

/// Notification email for one complaint
#[derive(Debug, Clone)]
pub struct DispatchNotice<'a> {
    complaint: &'a FiledComplaint,
    settings: &'a DispatchConfig,
}

impl<'a> DispatchNotice<'a> {
    pub fn new(complaint: &'a FiledComplaint, settings: &'a DispatchConfig) -> Self {
        Self {
            complaint,
            settings,
        }
    }

    fn urgency_label(&self) -> String {
        self.complaint.urgency.as_str().to_uppercase()
    }

    fn filed_by(&self) -> &str {
        self.complaint
            .submitted_by
            .as_ref()
            .map(|s| s.name.as_str())
            .or(self.complaint.source_handle.as_deref())
            .unwrap_or(FALLBACK_FILER)
    }

    fn filer_email(&self) -> &str {
        self.complaint
            .submitted_by
            .as_ref()
            .map_or(FALLBACK_FILER_EMAIL, |s| s.email.as_str())
    }

    fn from_line(&self) -> String {
        format!(
            "{} <{}>",
            self.settings.platform_name, self.settings.sender_email
        )
    }

    fn to_line(&self) -> String {
        let authority = &self.complaint.authority;
        format!("{} <{}>", authority.name, authority.email)
    }

    /// Subject without decoration
    pub fn subject(&self) -> String {
        format!(
            "Civic Complaint {} — {} [{}]",
            self.complaint.complaint_id,
            self.complaint.department,
            self.urgency_label()
        )
    }

    /// Local filing time, formatted as `d/m/yyyy, h:mm:ss am`
    pub fn filed_on(&self) -> String {
        const FORMAT: &str = "%-d/%-m/%Y, %-I:%M:%S %P";
        let filed_at = self.complaint.filed_at;

        match FixedOffset::east_opt(self.settings.utc_offset_minutes * 60) {
            Some(offset) => filed_at.with_timezone(&offset).format(FORMAT).to_string(),
            None => filed_at.format(FORMAT).to_string(),
        }
    }

    fn track_link(&self) -> String {
        format!("{}{}", self.settings.track_url, self.complaint.complaint_id)
    }

    fn body_lines(&self, with_separators: bool) -> Vec<String> {
        let c = self.complaint;
        let sla = c.urgency.sla_label();

        let mut lines = vec![
            format!("Dear {},", c.authority.name),
            String::new(),
            format!(
                "A new civic complaint has been filed through the {} and requires your attention.",
                self.settings.platform_name
            ),
            String::new(),
        ];

        if with_separators {
            lines.push(SEPARATOR.to_string());
        }
        lines.extend([
            format!("COMPLAINT ID    : {}", c.complaint_id),
            format!("PRIORITY        : {} — SLA {}", self.urgency_label(), sla),
            format!("DEPARTMENT      : {}", c.department),
            format!("LOCATION        : {}", c.location),
            format!("FILED ON        : {}", self.filed_on()),
            format!("FILED BY        : {}", self.filed_by()),
        ]);
        if with_separators {
            lines.push(SEPARATOR.to_string());
        }

        lines.extend([
            String::new(),
            "ISSUE TITLE:".to_string(),
            c.title.clone(),
            String::new(),
            "DESCRIPTION:".to_string(),
            c.description.clone(),
            String::new(),
            format!(
                "Please acknowledge this complaint within {} and update the status on the {}.",
                sla, self.settings.platform_name
            ),
            String::new(),
            format!("Track & respond: {}", self.track_link()),
            String::new(),
            "Regards,".to_string(),
            self.settings.signature.clone(),
        ]);
        lines
    }

    /// Plain-text email used for copy and preview
    pub fn plain_text(&self) -> String {
        let mut lines = vec![
            format!("FROM: {}", self.from_line()),
            format!("TO: {}", self.to_line()),
            format!("SUBJECT: 🚨 {}", self.subject()),
            String::new(),
        ];
        lines.extend(self.body_lines(true));
        lines.join("\n")
    }

    /// Complete `.eml` message, CRLF line endings
    pub fn eml(&self) -> String {
        let mut lines = vec![
            format!("From: {}", self.from_line()),
            format!("To: {}", self.to_line()),
            format!("CC: {}", self.filer_email()),
            format!("Subject: {}", self.subject()),
            format!("Date: {}", http_date(self.complaint.filed_at)),
            "MIME-Version: 1.0".to_string(),
            "Content-Type: text/plain; charset=UTF-8".to_string(),
            String::new(),
        ];
        lines.extend(self.body_lines(false));
        let mut message = lines.join("\r\n");
        message.push_str("\r\n");
        message
    }

    /// Ordered dispatch log
    pub fn log_steps(&self) -> Vec<DispatchStep> {
        let c = self.complaint;
        let step = |offset_ms: u64, text: String| DispatchStep { offset_ms, text };

        vec![
            step(0, format!("Complaint {} received", c.complaint_id)),
            step(
                400,
                format!("AI classified → {} [{}]", c.department, self.urgency_label()),
            ),
            step(900, format!("Location extracted → {}", c.location)),
            step(1400, format!("Looking up authority → {}", c.authority.zone)),
            step(1900, format!("Routing email → {}", c.authority.email)),
            step(2500, "Email dispatched successfully".to_string()),
        ]
    }
}

/// `Sat, 14 Mar 2026 09:30:00 GMT`
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::directory::{Authority, Department, Urgency};
    use crate::intake::{ComplaintId, ComplaintSource, ComplaintStatus, Submitter};
    use chrono::TimeZone;

    fn complaint() -> FiledComplaint {
        FiledComplaint {
            complaint_id: ComplaintId::parse("CMR-2026-4821").unwrap(),
            title: "Overflowing drain".to_string(),
            description: "Sewage on the street near the market.".to_string(),
            location: "Lajpat Nagar".to_string(),
            department: Department::Sanitation,
            urgency: Urgency::High,
            authority: Authority {
                name: "MCD Sanitation Department".to_string(),
                email: "mcd.west@mcdonline.gov.in".to_string(),
                zone: "West Zone".to_string(),
                short_name: "MCD Sanitation Dept".to_string(),
            },
            status: ComplaintStatus::Open,
            source: ComplaintSource::WebForm,
            source_handle: None,
            submitted_by: Some(Submitter {
                name: "Priya Sharma".to_string(),
                email: "priya@example.com".to_string(),
            }),
            filed_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_subject() {
        let c = complaint();
        let settings = Config::default().dispatch;
        let notice = DispatchNotice::new(&c, &settings);
        assert_eq!(
            notice.subject(),
            "Civic Complaint CMR-2026-4821 — Sanitation [HIGH]"
        );
    }

    #[test]
    fn test_filed_on_uses_configured_offset() {
        let c = complaint();
        let settings = Config::default().dispatch;
        let notice = DispatchNotice::new(&c, &settings);
        // 09:30 UTC is 15:00 IST
        assert_eq!(notice.filed_on(), "14/3/2026, 3:00:00 pm");
    }

    #[test]
    fn test_plain_text_contents() {
        let c = complaint();
        let settings = Config::default().dispatch;
        let text = DispatchNotice::new(&c, &settings).plain_text();

        assert!(text.starts_with("FROM: Civic Mirror Platform <noreply@civicmirror.in>"));
        assert!(text.contains("TO: MCD Sanitation Department <mcd.west@mcdonline.gov.in>"));
        assert!(text.contains("PRIORITY        : HIGH — SLA 24 hours"));
        assert!(text.contains("FILED BY        : Priya Sharma"));
        assert!(text.contains("Track & respond: https://civicmirror.in/track?id=CMR-2026-4821"));
        assert_eq!(text.matches(SEPARATOR).count(), 2);
    }

    #[test]
    fn test_eml_headers() {
        let c = complaint();
        let settings = Config::default().dispatch;
        let eml = DispatchNotice::new(&c, &settings).eml();

        assert!(eml.contains("CC: priya@example.com\r\n"));
        assert!(eml.contains("Date: Sat, 14 Mar 2026 09:30:00 GMT\r\n"));
        assert!(eml.contains("\r\n\r\nDear MCD Sanitation Department,"));
        assert!(!eml.contains(SEPARATOR));
        assert!(eml.ends_with("\r\n"));
    }

    #[test]
    fn test_feed_complaint_filer_falls_back_to_handle() {
        let mut c = complaint();
        c.submitted_by = None;
        c.source = ComplaintSource::Reddit;
        c.source_handle = Some("u/saket_residents".to_string());
        let settings = Config::default().dispatch;
        let notice = DispatchNotice::new(&c, &settings);

        assert!(notice.plain_text().contains("FILED BY        : u/saket_residents"));
        assert!(notice.eml().contains("CC: citizen@example.com"));
    }

    #[test]
    fn test_log_steps_are_ordered() {
        let c = complaint();
        let settings = Config::default().dispatch;
        let steps = DispatchNotice::new(&c, &settings).log_steps();

        assert_eq!(steps.len(), 6);
        assert!(steps.windows(2).all(|w| w[0].offset_ms < w[1].offset_ms));
        assert_eq!(steps[3].text, "Looking up authority → West Zone");
        assert_eq!(steps[5].text, "Email dispatched successfully");
    }
}
