mod compiler;
mod database;
mod discovery;
mod types;

pub use compiler::{
    compile_sources, compile_town_defs, ContentCompileError, ContentErrorCode, ContentSource,
    SourceLocation,
};
pub use database::TownDefs;
pub use types::{
    ChallengeDef, DialogueDef, DoorDef, NpcDef, NpcTier, ObjectDef, ReplyRule, StepDef,
    StepTrigger,
};
