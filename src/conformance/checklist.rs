//! Functional inspection checklist for probe-repair certificates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Communication channels verified after repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationChannels {
    pub radio: bool,
    pub optical: bool,
    pub cable: bool,
}

impl CommunicationChannels {
    /// At least one channel works
    pub fn passes(&self) -> bool {
        self.radio || self.optical || self.cable
    }
}

/// Inspection gates. Each flag is true when the check passed
/// (`structural_damage: true` means no damage was found).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionChecklist {
    pub seal_integrity: bool,
    pub kinematic_module: bool,
    pub trigger_force: bool,
    pub structural_damage: bool,
    pub touch_capability: bool,
    pub communication: CommunicationChannels,
}

impl InspectionChecklist {
    /// A checklist with every gate and channel passing
    pub fn all_passing() -> Self {
        Self {
            seal_integrity: true,
            kinematic_module: true,
            trigger_force: true,
            structural_damage: true,
            touch_capability: true,
            communication: CommunicationChannels {
                radio: true,
                optical: true,
                cable: true,
            },
        }
    }

    /// All six gates pass, communication counting as one gate
    pub fn passes(&self) -> bool {
        self.gates().iter().all(|(_, ok)| *ok)
    }

    /// The six gates with their evaluated state, in report order
    pub fn gates(&self) -> [(&'static str, bool); 6] {
        [
            ("seal_integrity", self.seal_integrity),
            ("kinematic_module", self.kinematic_module),
            ("trigger_force", self.trigger_force),
            ("structural_damage", self.structural_damage),
            ("touch_capability", self.touch_capability),
            ("communication", self.communication.passes()),
        ]
    }

    /// Names of the gates that did not pass
    pub fn failing_gates(&self) -> Vec<&'static str> {
        self.gates()
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn set(&mut self, item: ChecklistItem, value: bool) {
        match item {
            ChecklistItem::SealIntegrity => self.seal_integrity = value,
            ChecklistItem::KinematicModule => self.kinematic_module = value,
            ChecklistItem::TriggerForce => self.trigger_force = value,
            ChecklistItem::StructuralDamage => self.structural_damage = value,
            ChecklistItem::TouchCapability => self.touch_capability = value,
            ChecklistItem::Radio => self.communication.radio = value,
            ChecklistItem::Optical => self.communication.optical = value,
            ChecklistItem::Cable => self.communication.cable = value,
        }
    }
}

/// An individually settable checklist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistItem {
    SealIntegrity,
    KinematicModule,
    TriggerForce,
    StructuralDamage,
    TouchCapability,
    Radio,
    Optical,
    Cable,
}

impl ChecklistItem {
    pub fn all() -> &'static [ChecklistItem] {
        &[
            ChecklistItem::SealIntegrity,
            ChecklistItem::KinematicModule,
            ChecklistItem::TriggerForce,
            ChecklistItem::StructuralDamage,
            ChecklistItem::TouchCapability,
            ChecklistItem::Radio,
            ChecklistItem::Optical,
            ChecklistItem::Cable,
        ]
    }
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecklistItem::SealIntegrity => write!(f, "seal-integrity"),
            ChecklistItem::KinematicModule => write!(f, "kinematic-module"),
            ChecklistItem::TriggerForce => write!(f, "trigger-force"),
            ChecklistItem::StructuralDamage => write!(f, "structural-damage"),
            ChecklistItem::TouchCapability => write!(f, "touch-capability"),
            ChecklistItem::Radio => write!(f, "radio"),
            ChecklistItem::Optical => write!(f, "optical"),
            ChecklistItem::Cable => write!(f, "cable"),
        }
    }
}

impl std::str::FromStr for ChecklistItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "seal-integrity" | "seal" => Ok(ChecklistItem::SealIntegrity),
            "kinematic-module" | "kinematic" => Ok(ChecklistItem::KinematicModule),
            "trigger-force" | "trigger" => Ok(ChecklistItem::TriggerForce),
            "structural-damage" | "structure" => Ok(ChecklistItem::StructuralDamage),
            "touch-capability" | "touch" => Ok(ChecklistItem::TouchCapability),
            "radio" => Ok(ChecklistItem::Radio),
            "optical" => Ok(ChecklistItem::Optical),
            "cable" => Ok(ChecklistItem::Cable),
            _ => Err(format!(
                "Unknown checklist item: {} (valid: seal-integrity, kinematic-module, trigger-force, structural-damage, touch-capability, radio, optical, cable)",
                s
            )),
        }
    }
}
