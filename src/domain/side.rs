/// Side classification shared by sushi pieces and the character.
/// Properties are queried via methods, so the matching semantics
/// live in one place.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Side {
    Left,
    Right,
    #[default]
    None,   // no chopsticks: always safe to punch through
}

impl Side {
    /// Does this piece carry chopsticks on either side?
    pub fn is_armed(self) -> bool {
        !matches!(self, Side::None)
    }

    /// The side a punched piece is thrown towards.
    /// A `None` side has no opposite and maps to itself.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::None => Side::None,
        }
    }
}
