//! # Event Arena
//!
//! Fixed-capacity storage for the events of one voice.
//!
//! ## Memory Model
//! - Storage is allocated once, when the arena is created, and never grows
//! - Events are chained by slot index (`next`), not by reference, so an arena
//!   can be moved, copied or serialized without fixing up links
//! - Slots are never freed one by one; [`Arena::reset`] clears the whole arena
//!
//! ## Invariants
//! - `len() <= capacity()`; once full, [`Arena::append`] fails and nothing is
//!   written
//! - the chain from `head` is acyclic and ends at `tail`, whose `next` is `None`
//! - `total_ticks()` is the sum of `ticks()` over the chain

use crate::fixed_str::FixedStr;
use crate::parser::VoiceState;
use crate::pitch::{self, REST_MIDI};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Largest number of pitches one event can hold.
pub const MAX_CHORD_SIZE: usize = 6;

/// Maximum stored length of a voice identifier, in bytes.
pub const VOICE_ID_LEN: usize = 16;

/// Index of a slot inside an arena.
pub type EventIndex = u16;

/// Largest capacity an arena can be created with.
pub const MAX_CAPACITY: usize = EventIndex::MAX as usize;

/// Largest representable event duration, in ticks.
pub const MAX_TICKS: u16 = u16::MAX;

/// One timeline entry: a single pitch, a rest, or a chord sharing one duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Event {
    next: Option<EventIndex>,
    ticks: u16,
    chord_size: u8,
    midi: [u8; MAX_CHORD_SIZE],
}

impl Event {
    /// Build an unlinked event. Pitches past [`MAX_CHORD_SIZE`] are dropped.
    pub fn new(ticks: u16, notes: &[u8]) -> Self {
        let size = notes.len().min(MAX_CHORD_SIZE);
        let mut midi = [REST_MIDI; MAX_CHORD_SIZE];
        midi[..size].copy_from_slice(&notes[..size]);
        Self {
            next: None,
            ticks,
            chord_size: size as u8,
            midi,
        }
    }

    /// Duration in ticks.
    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    pub fn chord_size(&self) -> usize {
        usize::from(self.chord_size)
    }

    /// MIDI numbers of this event, in written order. 0 is a rest.
    pub fn notes(&self) -> &[u8] {
        &self.midi[..self.chord_size()]
    }

    /// Slot index of the successor, `None` at the end of the chain.
    pub fn next_index(&self) -> Option<EventIndex> {
        self.next
    }

    /// True when every pitch of the event is a rest.
    pub fn is_rest(&self) -> bool {
        self.notes().iter().all(|&m| pitch::is_rest_midi(m))
    }

    /// Frequencies in Hz of the pitches, in written order.
    pub fn frequencies(&self) -> impl Iterator<Item = f32> + '_ {
        self.notes().iter().map(|&m| pitch::midi_to_frequency(m))
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 2)?;
        state.serialize_field("ticks", &self.ticks)?;
        state.serialize_field("notes", self.notes())?;
        state.end()
    }
}

/// The arena had no free slot left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaFull;

/// Fixed-capacity, index-linked event storage for one voice.
#[derive(Debug, Clone)]
pub struct Arena {
    slots: Box<[Event]>,
    count: usize,
    head: Option<EventIndex>,
    tail: Option<EventIndex>,
    total_ticks: u64,
    voice_id: FixedStr<VOICE_ID_LEN>,
    /// Parser progress of this voice while another voice is active.
    pub(crate) saved: VoiceState,
}

impl Arena {
    /// Create an arena holding up to `capacity` events
    /// (clamped to [`MAX_CAPACITY`]).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_CAPACITY);
        Self {
            slots: vec![Event::default(); capacity].into_boxed_slice(),
            count: 0,
            head: None,
            tail: None,
            total_ticks: 0,
            voice_id: FixedStr::new(),
            saved: VoiceState::default(),
        }
    }

    /// Forget every event and the voice binding, keeping the storage.
    pub fn reset(&mut self) {
        self.count = 0;
        self.head = None;
        self.tail = None;
        self.total_ticks = 0;
        self.voice_id.clear();
        self.saved = VoiceState::default();
    }

    /// Take the next free slot, default-initialised.
    pub fn alloc(&mut self) -> Option<EventIndex> {
        if self.count >= self.slots.len() {
            return None;
        }
        let index = self.count;
        self.slots[index] = Event::default();
        self.count += 1;
        Some(index as EventIndex)
    }

    /// Commit a new event at the end of the chain.
    ///
    /// This is the only fallible mutation and the single point where capacity
    /// is enforced.
    pub fn append(&mut self, ticks: u16, notes: &[u8]) -> Result<EventIndex, ArenaFull> {
        let index = self.alloc().ok_or(ArenaFull)?;
        self.slots[usize::from(index)] = Event::new(ticks, notes);
        match self.tail {
            Some(tail) => self.slots[usize::from(tail)].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.total_ticks += u64::from(ticks);
        Ok(index)
    }

    /// Commit a copy of `event` at the end of the chain.
    pub fn append_copy(&mut self, event: &Event) -> Result<EventIndex, ArenaFull> {
        let copy = *event;
        self.append(copy.ticks, copy.notes())
    }

    /// Event stored in slot `index`, if that slot is in use.
    pub fn get(&self, index: EventIndex) -> Option<&Event> {
        self.slots[..self.count].get(usize::from(index))
    }

    /// First event of the chain.
    pub fn first(&self) -> Option<&Event> {
        self.head.and_then(|i| self.get(i))
    }

    /// Successor of `event` in the chain.
    pub fn next(&self, event: &Event) -> Option<&Event> {
        event.next.and_then(|i| self.get(i))
    }

    pub fn head_index(&self) -> Option<EventIndex> {
        self.head
    }

    pub fn tail_index(&self) -> Option<EventIndex> {
        self.tail
    }

    /// Walk the chain from the head.
    pub fn iter(&self) -> EventIter<'_> {
        EventIter {
            arena: self,
            current: self.first(),
        }
    }

    /// Number of events in use.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Free slots left.
    pub fn available(&self) -> usize {
        self.slots.len() - self.count
    }

    /// Sum of all event durations, in ticks.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Identifier of the voice bound to this arena (empty when unbound).
    pub fn voice_id(&self) -> &str {
        self.voice_id.as_str()
    }

    pub(crate) fn bind_voice(&mut self, id: &str) {
        self.voice_id.set(id);
    }
}

/// Iterator over an arena's chain.
pub struct EventIter<'a> {
    arena: &'a Arena,
    current: Option<&'a Event>,
}

impl<'a> Iterator for EventIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.current?;
        self.current = self.arena.next(event);
        Some(event)
    }
}

impl<'a> IntoIterator for &'a Arena {
    type Item = &'a Event;
    type IntoIter = EventIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
