use crate::app::{Aabb, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct DoorDef {
    pub offset: Vec3,
    pub label: String,
}

/// A positioned piece of static scenery.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDef {
    pub id: String,
    pub label: String,
    pub position: Vec3,
    pub yaw: f32,
    pub collider: Option<Aabb>,
    pub door: Option<DoorDef>,
    pub large: bool,
    pub tags: Vec<String>,
}

impl ObjectDef {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcTier {
    Main,
    Background,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    pub tier: NpcTier,
    /// Spawn point; also the tether anchor for main-cast NPCs.
    pub position: Vec3,
    pub wander_radius: Option<f32>,
    /// Units per reference tick (1/60 s).
    pub speed: f32,
    pub scale: f32,
    pub heading: Option<f32>,
    pub dialogue: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRule {
    /// Lowercase; a rule matches when any keyword is a substring of the input.
    pub keywords: Vec<String>,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueDef {
    pub id: String,
    pub lines: Vec<String>,
    pub replies: Vec<ReplyRule>,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepTrigger {
    Talk { npc: String },
    Near { tag: String, radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepDef {
    pub description: String,
    pub trigger: StepTrigger,
    pub say: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeDef {
    pub id: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<StepDef>,
    pub reward: String,
}
