/// Consecutive non-capturing turns after which a game with a lone piece is decided by material.
pub const STALL_LIMIT: u32 = 30;

/// What distinguishes the members of the checkers family.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RuleSet {
    /// Kings slide any distance and capture from afar.
    pub flying_kings: bool,
    /// Men may jump backwards.
    pub backward_captures: bool,
    pub size: i32,
}

impl RuleSet {
    pub const fn checkers() -> Self {
        Self { flying_kings: false, backward_captures: false, size: 8 }
    }

    pub const fn pool() -> Self {
        Self { flying_kings: true, backward_captures: true, size: 8 }
    }
}
