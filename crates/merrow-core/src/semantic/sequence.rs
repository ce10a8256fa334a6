//! Sequence diagram model.

use indexmap::IndexMap;

use crate::identifier::Id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    id: Id,
    description: String,
}

impl Actor {
    pub fn id(&self) -> Id {
        self.id
    }

    /// Text shown in the actor box: the alias, or the id.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Line and head of a message arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// `->>`
    Solid,
    /// `-->>`
    Dotted,
    /// `->`
    SolidOpen,
    /// `-->`
    DottedOpen,
    /// `-x`
    SolidCross,
    /// `--x`
    DottedCross,
}

impl LineType {
    pub fn is_dotted(self) -> bool {
        matches!(self, Self::Dotted | Self::DottedOpen | Self::DottedCross)
    }

    pub fn has_arrowhead(self) -> bool {
        matches!(self, Self::Solid | Self::Dotted)
    }

    pub fn has_crosshead(self) -> bool {
        matches!(self, Self::SolidCross | Self::DottedCross)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotePlacement {
    LeftOf,
    RightOf,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Loop,
    Opt,
    Alt,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Opt => "opt",
            Self::Alt => "alt",
        }
    }
}

/// One statement of a sequence diagram, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceEvent {
    Message {
        from: Id,
        to: Id,
        text: String,
        line: LineType,
    },
    Note {
        actors: Vec<Id>,
        placement: NotePlacement,
        text: String,
    },
    BlockStart {
        kind: BlockKind,
        label: String,
    },
    /// `else` inside an `alt` block.
    BlockElse {
        label: String,
    },
    BlockEnd,
}

#[derive(Debug, Clone, Default)]
pub struct SequenceModel {
    actors: IndexMap<Id, Actor>,
    events: Vec<SequenceEvent>,
}

impl SequenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Position of an actor in declaration order.
    pub fn actor_index(&self, id: Id) -> Option<usize> {
        self.actors.get_index_of(&id)
    }

    pub fn events(&self) -> &[SequenceEvent] {
        &self.events
    }

    /// Declares an actor. A description replaces an earlier implicit one.
    pub fn add_actor(&mut self, id: Id, description: Option<String>) {
        let actor = self.actors.entry(id).or_insert_with(|| Actor {
            id,
            description: id.to_string(),
        });
        if let Some(description) = description {
            actor.description = description;
        }
    }

    /// Records an event, implicitly declaring the actors it mentions.
    pub fn add_event(&mut self, event: SequenceEvent) {
        match &event {
            SequenceEvent::Message { from, to, .. } => {
                self.add_actor(*from, None);
                self.add_actor(*to, None);
            }
            SequenceEvent::Note { actors, .. } => {
                for actor in actors {
                    self.add_actor(*actor, None);
                }
            }
            _ => {}
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_declares_actors_in_order() {
        let mut model = SequenceModel::new();
        model.add_event(SequenceEvent::Message {
            from: Id::new("Bob"),
            to: Id::new("Alice"),
            text: "hi".to_string(),
            line: LineType::Solid,
        });

        assert_eq!(model.actor_index(Id::new("Bob")), Some(0));
        assert_eq!(model.actor_index(Id::new("Alice")), Some(1));
    }

    #[test]
    fn test_alias_overrides_description() {
        let mut model = SequenceModel::new();
        let a = Id::new("A");
        model.add_actor(a, None);
        model.add_actor(a, Some("Alice".to_string()));

        assert_eq!(model.actors().next().unwrap().description(), "Alice");
    }

    #[test]
    fn test_line_type_heads() {
        assert!(LineType::Solid.has_arrowhead());
        assert!(!LineType::SolidOpen.has_arrowhead());
        assert!(LineType::DottedCross.has_crosshead());
        assert!(LineType::DottedOpen.is_dotted());
    }
}
