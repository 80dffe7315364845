use std::collections::HashMap;

use super::types::{ChallengeDef, DialogueDef, NpcDef, ObjectDef};

/// Compiled town content. Every list keeps source order (files sorted by
/// relative path, then document order).
#[derive(Debug, Default, Clone)]
pub struct TownDefs {
    objects: Vec<ObjectDef>,
    npcs: Vec<NpcDef>,
    dialogues: Vec<DialogueDef>,
    challenges: Vec<ChallengeDef>,
    dialogue_index_by_id: HashMap<String, usize>,
}

impl TownDefs {
    pub fn new(
        objects: Vec<ObjectDef>,
        npcs: Vec<NpcDef>,
        dialogues: Vec<DialogueDef>,
        challenges: Vec<ChallengeDef>,
    ) -> Self {
        let dialogue_index_by_id = dialogues
            .iter()
            .enumerate()
            .map(|(index, dialogue)| (dialogue.id.clone(), index))
            .collect();
        Self {
            objects,
            npcs,
            dialogues,
            challenges,
            dialogue_index_by_id,
        }
    }

    pub fn objects(&self) -> &[ObjectDef] {
        &self.objects
    }

    pub fn npcs(&self) -> &[NpcDef] {
        &self.npcs
    }

    pub fn dialogues(&self) -> &[DialogueDef] {
        &self.dialogues
    }

    pub fn challenges(&self) -> &[ChallengeDef] {
        &self.challenges
    }

    pub fn dialogue(&self, id: &str) -> Option<&DialogueDef> {
        self.dialogue_index_by_id
            .get(id)
            .and_then(|index| self.dialogues.get(*index))
    }
}
