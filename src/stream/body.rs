//! Tracked-body data model
//!
//! Body frames deliver skeletal tracking results instead of pixel samples:
//! one record per tracked-body slot, each carrying a joint skeleton and hand
//! states. The device reports a fixed tracked-body capacity; every body frame
//! carries exactly that many records, tracked or not.

use crate::mapping::CameraSpacePoint;

/// Tracking confidence for a joint or body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    /// Not visible to the sensor
    #[default]
    NotTracked,
    /// Position estimated from neighboring joints
    Inferred,
    /// Position directly observed
    Tracked,
}

/// Recognized hand pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandState {
    /// No confident classification
    #[default]
    Unknown,
    /// Hand not visible
    NotTracked,
    /// Open palm
    Open,
    /// Closed fist
    Closed,
    /// Index finger extended
    Lasso,
}

/// The 25 joints of the tracked skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointKind {
    /// Every joint, in skeleton order
    pub const ALL: [JointKind; 25] = [
        JointKind::SpineBase,
        JointKind::SpineMid,
        JointKind::Neck,
        JointKind::Head,
        JointKind::ShoulderLeft,
        JointKind::ElbowLeft,
        JointKind::WristLeft,
        JointKind::HandLeft,
        JointKind::ShoulderRight,
        JointKind::ElbowRight,
        JointKind::WristRight,
        JointKind::HandRight,
        JointKind::HipLeft,
        JointKind::KneeLeft,
        JointKind::AnkleLeft,
        JointKind::FootLeft,
        JointKind::HipRight,
        JointKind::KneeRight,
        JointKind::AnkleRight,
        JointKind::FootRight,
        JointKind::SpineShoulder,
        JointKind::HandTipLeft,
        JointKind::ThumbLeft,
        JointKind::HandTipRight,
        JointKind::ThumbRight,
    ];
}

/// One joint of a tracked skeleton
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// Which joint this is
    pub kind: JointKind,
    /// 3-D position in camera space (meters)
    pub position: CameraSpacePoint,
    /// Tracking confidence for this joint
    pub tracking: TrackingState,
}

/// One tracked-body slot of a body frame
#[derive(Debug, Clone, Default)]
pub struct Body {
    /// Stable identifier while the body stays tracked
    pub tracking_id: u64,
    /// Whether this slot holds a tracked body
    pub is_tracked: bool,
    /// Joint skeleton; empty when untracked
    pub joints: Vec<Joint>,
    /// Left hand pose
    pub hand_left: HandState,
    /// Right hand pose
    pub hand_right: HandState,
}

impl Body {
    /// An empty, untracked body slot
    pub fn untracked() -> Self {
        Self::default()
    }

    /// Look up a joint by kind
    pub fn joint(&self, kind: JointKind) -> Option<&Joint> {
        self.joints.iter().find(|j| j.kind == kind)
    }
}
