//! Preprocessing record: macro definitions and the entities (expansions,
//! inclusions) seen while preprocessing a translation.

use crate::ids::to_u32;
use crate::source::SourceRange;
use crate::{FileId, MacroId, Name, PreprocessedEntityId};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MacroDefinition {
    pub name: Name,
    pub range: SourceRange,
    pub params: Vec<Name>,
    pub is_function_like: bool,
}

raw_enum! {
    #[derive(Default)]
    pub enum InclusionKind {
        #[default]
        Include,
        Import,
        IncludeNext,
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PreprocessedEntity {
    MacroExpansion {
        name: Name,
        /// `None` for builtin macros.
        definition: Option<MacroId>,
        range: SourceRange,
    },
    InclusionDirective {
        file_name: String,
        kind: InclusionKind,
        range: SourceRange,
        imported_file: Option<FileId>,
    },
}

impl PreprocessedEntity {
    pub fn range(&self) -> SourceRange {
        match self {
            PreprocessedEntity::MacroExpansion { range, .. }
            | PreprocessedEntity::InclusionDirective { range, .. } => *range,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PreprocessingRecord {
    macros: Vec<MacroDefinition>,
    entities: Vec<PreprocessedEntity>,
}

impl PreprocessingRecord {
    pub fn add_macro(&mut self, def: MacroDefinition) -> MacroId {
        let id = MacroId::new(to_u32(self.macros.len(), "macro definitions"));
        self.macros.push(def);
        id
    }

    pub fn add_entity(&mut self, entity: PreprocessedEntity) -> PreprocessedEntityId {
        let id = PreprocessedEntityId::new(to_u32(self.entities.len(), "preprocessed entities"));
        self.entities.push(entity);
        id
    }

    #[inline]
    pub fn macro_def(&self, id: MacroId) -> &MacroDefinition {
        &self.macros[id.index()]
    }

    #[inline]
    pub fn entity(&self, id: PreprocessedEntityId) -> &PreprocessedEntity {
        &self.entities[id.index()]
    }

    pub fn macros(&self) -> &[MacroDefinition] {
        &self.macros
    }

    pub fn entities(&self) -> &[PreprocessedEntity] {
        &self.entities
    }

    /// Most recent definition of `name`.
    pub fn find_macro(&self, name: Name) -> Option<MacroId> {
        self.macros
            .iter()
            .rposition(|m| m.name == name)
            .map(|i| MacroId::new(to_u32(i, "macro definitions")))
    }
}
