use std::{collections::BTreeSet, fmt::Display, ops::RangeInclusive};

use num::FromPrimitive;
use num_derive::FromPrimitive;

use crate::error::{Error, Result};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive, Debug)]
#[repr(u32)]
pub enum Letter {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
    I = 8,
    J = 9,
    K = 10,
    L = 11,
    M = 12,
    N = 13,
    O = 14,
    P = 15,
    Q = 16,
    R = 17,
    S = 18,
    T = 19,
    U = 20,
    V = 21,
    W = 22,
    X = 23,
    Y = 24,
    Z = 25,
}

/// Name of a user-owned matrix, a single uppercase letter.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct MatrixId(Letter);

impl MatrixId {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A'..='Z' => Some(MatrixId(FromPrimitive::from_u32(c as u32 - 'A' as u32)?)),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        (self.0 as u8 + b'A') as char
    }

    pub fn letter(self) -> Letter {
        self.0
    }

    pub fn all() -> impl Iterator<Item = MatrixId> {
        ('A'..='Z').filter_map(MatrixId::from_char)
    }

    fn offset(self, by: i32) -> Option<Self> {
        let index = self.0 as i32 + by;
        u32::try_from(index)
            .ok()
            .and_then(FromPrimitive::from_u32)
            .map(MatrixId)
    }

    pub fn prev(self) -> Option<Self> {
        self.offset(-1)
    }

    pub fn next(self) -> Option<Self> {
        self.offset(1)
    }
}

impl From<Letter> for MatrixId {
    fn from(letter: Letter) -> Self {
        MatrixId(letter)
    }
}

impl TryFrom<char> for MatrixId {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        MatrixId::from_char(c).ok_or(Error::UnknownSymbol(c))
    }
}

impl Display for MatrixId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub const HANDLE_RANGE: RangeInclusive<u16> = 1111..=9999;

/// Transient identifier of a literal or intermediate result within one evaluation session.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct Handle(u16);

impl Handle {
    pub fn get(self) -> u16 {
        self.0
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out calc handles in increasing order until [`HANDLE_RANGE`] is exhausted.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    next: u16,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self {
            next: *HANDLE_RANGE.start(),
        }
    }
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Result<Handle> {
        if !HANDLE_RANGE.contains(&self.next) {
            return Err(Error::TooComplex);
        }
        let handle = Handle(self.next);
        self.next += 1;
        Ok(handle)
    }
}

/// Free-list of matrix letters, lowest letter first.
#[derive(Debug, Clone)]
pub struct LetterAllocator {
    free: BTreeSet<MatrixId>,
}

impl Default for LetterAllocator {
    fn default() -> Self {
        Self {
            free: MatrixId::all().collect(),
        }
    }
}

impl LetterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> Result<MatrixId> {
        let id = *self.free.iter().next().ok_or(Error::NoFreeIdentifier)?;
        self.free.remove(&id);
        Ok(id)
    }

    /// Marks a specific letter as used. Returns false if it was already taken.
    pub fn claim(&mut self, id: MatrixId) -> bool {
        self.free.remove(&id)
    }

    pub fn release(&mut self, id: MatrixId) {
        self.free.insert(id);
    }

    pub fn is_free(&self, id: MatrixId) -> bool {
        self.free.contains(&id)
    }

    pub fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    pub fn free(&self) -> usize {
        self.free.len()
    }
}
