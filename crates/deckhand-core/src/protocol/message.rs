use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::protocol::error::{DecisionFault, ProtocolError};

static NEXT_CHOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a [`Choice`]. Clones share it, fresh choices never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceId(u64);

impl ChoiceId {
    fn fresh() -> Self {
        Self(NEXT_CHOICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One view per seated player, index-aligned with the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Views<V>(Vec<V>);

impl<V> Views<V> {
    pub fn new(views: Vec<V>) -> Self {
        Self(views)
    }

    /// Every player receives the same fact.
    pub fn uniform(view: V, players: usize) -> Self
    where
        V: Clone,
    {
        Self(vec![view; players])
    }

    /// Builds a per-recipient view, which is how hidden information is kept hidden.
    pub fn from_fn(players: usize, f: impl FnMut(usize) -> V) -> Self {
        Self((0..players).map(f).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, player: usize) -> Option<&V> {
        self.0.get(player)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<V> {
        self.0
    }
}

/// A request for exactly one player to pick one of a non-empty list of options.
#[derive(Debug, Clone, Serialize)]
pub struct Choice<O> {
    #[serde(skip)]
    id: ChoiceId,
    player: usize,
    description: String,
    options: Vec<O>,
}

impl<O> Choice<O> {
    pub fn new(
        player: usize,
        description: impl Into<String>,
        options: Vec<O>,
    ) -> Result<Self, ProtocolError> {
        let description = description.into();
        if options.is_empty() {
            return Err(ProtocolError::InvalidChoice {
                player,
                description,
            });
        }

        Ok(Self {
            id: ChoiceId::fresh(),
            player,
            description,
            options,
        })
    }

    pub fn id(&self) -> ChoiceId {
        self.id
    }

    pub fn player(&self) -> usize {
        self.player
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn options(&self) -> &[O] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&O> {
        self.options.get(index)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.options.len()
    }

    /// Identity comparison; `==` only compares contents.
    pub fn same(&self, other: &Choice<O>) -> bool {
        self.id == other.id
    }

    /// Builds the decision selecting `index`, bound to this choice.
    pub fn decision(&self, index: usize) -> Result<Decision<O>, ProtocolError>
    where
        O: Clone,
    {
        let option = self
            .options
            .get(index)
            .ok_or(ProtocolError::InvalidDecision {
                index,
                fault: DecisionFault::OutOfRange {
                    options: self.options.len(),
                },
            })?;

        Ok(Decision {
            choice: self.id,
            index,
            option: option.clone(),
        })
    }

    pub fn is_valid_decision(&self, decision: &Decision<O>) -> bool
    where
        O: PartialEq,
    {
        self.validate_decision(decision).is_ok()
    }

    pub fn validate_decision(&self, decision: &Decision<O>) -> Result<(), ProtocolError>
    where
        O: PartialEq,
    {
        let fault = if decision.choice != self.id {
            DecisionFault::ForeignChoice
        } else {
            match self.options.get(decision.index) {
                None => DecisionFault::OutOfRange {
                    options: self.options.len(),
                },
                Some(offered) if *offered != decision.option => DecisionFault::OptionMismatch,
                Some(_) => return Ok(()),
            }
        };

        Err(ProtocolError::InvalidDecision {
            index: decision.index,
            fault,
        })
    }
}

impl<O: PartialEq> PartialEq for Choice<O> {
    fn eq(&self, other: &Self) -> bool {
        self.player == other.player
            && self.description == other.description
            && self.options == other.options
    }
}

/// A player's answer to a specific [`Choice`].
#[derive(Debug, Clone, Serialize)]
pub struct Decision<O> {
    #[serde(skip)]
    choice: ChoiceId,
    index: usize,
    option: O,
}

impl<O> Decision<O> {
    pub fn choice_id(&self) -> ChoiceId {
        self.choice
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn option(&self) -> &O {
        &self.option
    }
}

impl<O: PartialEq> PartialEq for Decision<O> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.option == other.option
    }
}

/// What a process hands the engine at each suspension point: zero or more
/// rounds of views, then at most one choice. Without a choice the process is
/// resumed with no decision.
#[derive(Debug, Clone)]
pub struct MessageBundle<V, O> {
    views: Vec<Views<V>>,
    choice: Option<Choice<O>>,
}

impl<V, O> Default for MessageBundle<V, O> {
    fn default() -> Self {
        Self {
            views: Vec::new(),
            choice: None,
        }
    }
}

impl<V, O> MessageBundle<V, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_views(views: Views<V>) -> Self {
        Self {
            views: vec![views],
            choice: None,
        }
    }

    pub fn of_choice(choice: Choice<O>) -> Self {
        Self {
            views: Vec::new(),
            choice: Some(choice),
        }
    }

    pub fn with_views(mut self, views: Views<V>) -> Self {
        self.views.push(views);
        self
    }

    pub fn with_choice(mut self, choice: Choice<O>) -> Self {
        self.choice = Some(choice);
        self
    }

    pub fn push_views(&mut self, views: Views<V>) {
        self.views.push(views);
    }

    pub fn views(&self) -> &[Views<V>] {
        &self.views
    }

    pub fn choice(&self) -> Option<&Choice<O>> {
        self.choice.as_ref()
    }

    pub fn into_parts(self) -> (Vec<Views<V>>, Option<Choice<O>>) {
        (self.views, self.choice)
    }
}

/// Entry in a player's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Message<V, O> {
    View(V),
    Choice(Choice<O>),
    Decision(Decision<O>),
}
