// ── Device edit session ──
//
// Ephemeral create/edit workflow state. Owns the parameter draft list
// for its lifetime and knows how to serialize itself into a create or
// full-replace request. Network I/O stays in the controller; this
// module is the pure state machine.

use simfleet_api::models::{Device, DeviceStatus, GenerationMode, Parameter};
use uuid::Uuid;

use crate::draft::ParamDraftList;
use crate::error::CoreError;

// ── SessionMode ─────────────────────────────────────────────────────

/// Lifecycle state of the edit session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    Closed,
    /// A new device is being authored under a reserved identity.
    Creating { uuid: String },
    /// An existing device is being edited in place.
    Editing { uuid: String },
}

impl SessionMode {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// The identity the session will submit under, if open.
    pub fn target_uuid(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Creating { uuid } | Self::Editing { uuid } => Some(uuid),
        }
    }
}

// ── DeviceForm ──────────────────────────────────────────────────────

/// The user-editable device fields. Everything else in the submitted
/// record is a fixed submission default or session-derived.
#[derive(Debug, Clone, Default)]
pub struct DeviceForm {
    pub name: String,
    pub publish_topic: String,
    pub subscribe_topic: Option<String>,
    pub interval_ms: u32,
}

// ── Submission ──────────────────────────────────────────────────────

/// Which request a submission dispatches as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    /// `POST /api/devices`
    Create,
    /// `PUT /api/devices/{uuid}`
    Update,
}

/// A fully built submission, ready to dispatch.
#[derive(Debug, Clone)]
pub struct Submission {
    pub action: SubmitAction,
    pub device: Device,
}

// ── EditSession ─────────────────────────────────────────────────────

/// The create/edit workflow state machine.
///
/// At most one session exists per panel; opening a new one replaces the
/// old (the controller enforces the optional unsaved-draft guard).
#[derive(Debug, Default)]
pub struct EditSession {
    mode: SessionMode,
    draft: ParamDraftList,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        !self.mode.is_closed()
    }

    /// An open session holding staged parameters that would be lost on
    /// replacement.
    pub fn is_dirty(&self) -> bool {
        self.is_open() && !self.draft.is_empty()
    }

    pub fn draft(&self) -> &ParamDraftList {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ParamDraftList {
        &mut self.draft
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Open a create session: fresh empty draft and a newly generated
    /// identity reserved for the device. Returns the reserved uuid.
    pub fn begin_create(&mut self) -> String {
        let uuid = Uuid::new_v4().to_string();
        self.mode = SessionMode::Creating { uuid: uuid.clone() };
        self.draft = ParamDraftList::new();
        uuid
    }

    /// Open an edit session seeded from a freshly fetched device.
    pub fn begin_edit(&mut self, device: &Device) {
        self.mode = SessionMode::Editing {
            uuid: device.uuid.clone(),
        };
        self.draft = ParamDraftList::from_params(device.params.clone());
    }

    /// Close the session and discard the draft.
    pub fn cancel(&mut self) {
        self.mode = SessionMode::Closed;
        self.draft.clear();
    }

    // ── Submission building ──────────────────────────────────────────

    /// Build the full device record for this session.
    ///
    /// `cached` is the registry's current view of the target (editing
    /// only): its status is preserved on update, falling back to
    /// STOPPED when the device vanished from cache mid-edit, and its
    /// `csv_file_path` is carried so an upload survives an unrelated
    /// edit. Creating always submits STOPPED. Submission defaults
    /// (`mode=RANDOM, qos=0, retain=false, csv_loop=true`) are fixed --
    /// they are not user-editable.
    pub fn build_submission(
        &self,
        form: &DeviceForm,
        cached: Option<&Device>,
    ) -> Result<Submission, CoreError> {
        let (action, uuid, status) = match &self.mode {
            SessionMode::Closed => return Err(CoreError::SessionClosed),
            SessionMode::Creating { uuid } => {
                (SubmitAction::Create, uuid.clone(), DeviceStatus::Stopped)
            }
            SessionMode::Editing { uuid } => (
                SubmitAction::Update,
                uuid.clone(),
                cached.map_or(DeviceStatus::Stopped, |d| d.status),
            ),
        };

        if form.name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "device name must not be empty".into(),
            });
        }
        if form.publish_topic.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "publish topic must not be empty".into(),
            });
        }
        if form.interval_ms == 0 {
            return Err(CoreError::ValidationFailed {
                message: "publish interval must be positive".into(),
            });
        }

        let params: Vec<Parameter> = self
            .draft
            .as_slice()
            .iter()
            .map(|p| Parameter {
                device_uuid: Some(uuid.clone()),
                ..p.clone()
            })
            .collect();

        Ok(Submission {
            action,
            device: Device {
                uuid,
                name: form.name.clone(),
                status,
                mode: GenerationMode::Random,
                publish_topic: form.publish_topic.clone(),
                subscribe_topic: form.subscribe_topic.clone(),
                interval_ms: form.interval_ms,
                qos: 0,
                retain: false,
                csv_file_path: cached.and_then(|d| d.csv_file_path.clone()),
                csv_loop: true,
                params,
                messages: Vec::new(),
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::draft::ParamForm;
    use simfleet_api::models::ParamKind;

    fn form() -> DeviceForm {
        DeviceForm {
            name: "Sim1".into(),
            publish_topic: "fleet/sim1".into(),
            subscribe_topic: None,
            interval_ms: 1000,
        }
    }

    fn param(name: &str) -> simfleet_api::models::Parameter {
        ParamForm {
            name: name.into(),
            kind: ParamKind::Float,
            ..ParamForm::default()
        }
        .build()
        .unwrap()
    }

    fn cached_device(uuid: &str, status: &str) -> Device {
        serde_json::from_value(serde_json::json!({
            "uuid": uuid,
            "name": "Sim1",
            "status": status,
            "publish_topic": "fleet/sim1",
            "params": [
                { "id": 7, "device_uuid": uuid, "param_name": "temp", "type": "float",
                  "min_val": 0.0, "max_val": 100.0 }
            ],
        }))
        .unwrap()
    }

    #[test]
    fn begin_create_yields_fresh_unique_identities() {
        let mut session = EditSession::new();
        let mut seen = HashSet::new();
        for _ in 0..32 {
            let uuid = session.begin_create();
            assert!(matches!(session.mode(), SessionMode::Creating { .. }));
            assert!(session.draft().is_empty());
            assert!(seen.insert(uuid), "identity reissued");
        }
    }

    #[test]
    fn begin_edit_seeds_draft_from_device_params() {
        let mut session = EditSession::new();
        let device = cached_device("a-1", "RUNNING");
        session.begin_edit(&device);

        assert_eq!(session.mode().target_uuid(), Some("a-1"));
        assert_eq!(session.draft().as_slice(), device.params.as_slice());
    }

    #[test]
    fn cancel_discards_everything() {
        let mut session = EditSession::new();
        session.begin_create();
        session.draft_mut().push(param("temp"));
        session.cancel();

        assert!(session.mode().is_closed());
        assert!(session.draft().is_empty());
        assert!(!session.is_dirty());
    }

    #[test]
    fn creating_submits_stopped_with_fixed_defaults() {
        let mut session = EditSession::new();
        let uuid = session.begin_create();
        session.draft_mut().push(param("temp"));

        let sub = session.build_submission(&form(), None).unwrap();

        assert_eq!(sub.action, SubmitAction::Create);
        assert_eq!(sub.device.uuid, uuid);
        assert_eq!(sub.device.status, DeviceStatus::Stopped);
        assert_eq!(sub.device.mode, GenerationMode::Random);
        assert_eq!(sub.device.qos, 0);
        assert!(!sub.device.retain);
        assert!(sub.device.csv_loop);
        assert_eq!(sub.device.params[0].device_uuid.as_deref(), Some(uuid.as_str()));
    }

    #[test]
    fn editing_preserves_cached_status() {
        let mut session = EditSession::new();
        let device = cached_device("a-1", "RUNNING");
        session.begin_edit(&device);

        let sub = session.build_submission(&form(), Some(&device)).unwrap();

        assert_eq!(sub.action, SubmitAction::Update);
        assert_eq!(sub.device.status, DeviceStatus::Running);
    }

    #[test]
    fn editing_falls_back_to_stopped_when_device_vanished() {
        let mut session = EditSession::new();
        session.begin_edit(&cached_device("a-1", "RUNNING"));

        // Device no longer in cache mid-edit.
        let sub = session.build_submission(&form(), None).unwrap();
        assert_eq!(sub.device.status, DeviceStatus::Stopped);
    }

    #[test]
    fn every_param_is_stamped_with_the_target_uuid() {
        let mut session = EditSession::new();
        let uuid = session.begin_create();
        session.draft_mut().push(param("temp"));
        session.draft_mut().push(param("humidity"));

        let sub = session.build_submission(&form(), None).unwrap();
        assert!(
            sub.device
                .params
                .iter()
                .all(|p| p.device_uuid.as_deref() == Some(uuid.as_str()))
        );
    }

    #[test]
    fn editing_carries_cached_csv_file_path() {
        let mut session = EditSession::new();
        let mut device = cached_device("a-1", "STOPPED");
        device.csv_file_path = Some("data/csv/a-1_replay.csv".into());
        session.begin_edit(&device);

        let sub = session.build_submission(&form(), Some(&device)).unwrap();
        assert_eq!(
            sub.device.csv_file_path.as_deref(),
            Some("data/csv/a-1_replay.csv")
        );
    }

    #[test]
    fn closed_session_cannot_submit() {
        let session = EditSession::new();
        let err = session.build_submission(&form(), None).unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed));
    }

    #[test]
    fn form_fields_are_validated_before_dispatch() {
        let mut session = EditSession::new();
        session.begin_create();

        let mut bad = form();
        bad.name = "  ".into();
        assert!(session.build_submission(&bad, None).is_err());

        let mut bad = form();
        bad.publish_topic = String::new();
        assert!(session.build_submission(&bad, None).is_err());

        let mut bad = form();
        bad.interval_ms = 0;
        assert!(session.build_submission(&bad, None).is_err());
    }
}
