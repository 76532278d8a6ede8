//! Account balance and single-position tracking.
//!
//! The ledger is long-only: `Sell` never opens a short, it only closes.
//! Balance is not floored at zero; sizing is unconstrained by cash, so a
//! losing leveraged trade can leave it negative.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    Long { entry_price: f64 },
}

impl PositionState {
    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long { .. })
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            PositionState::Flat => None,
            PositionState::Long { entry_price } => Some(*entry_price),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    balance: f64,
    position: PositionState,
    position_size: f64,
}

impl PositionLedger {
    pub fn new(initial_balance: f64) -> Self {
        PositionLedger {
            balance: initial_balance,
            position: PositionState::Flat,
            position_size: 0.0,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn position_size(&self) -> f64 {
        self.position_size
    }

    pub fn is_long(&self) -> bool {
        self.position.is_long()
    }

    /// Open a long position. Returns `false` without touching state if one is
    /// already open (no averaging in).
    pub fn open(&mut self, price: f64, size: f64) -> bool {
        if self.position.is_long() {
            return false;
        }
        self.balance -= size * price;
        self.position = PositionState::Long { entry_price: price };
        self.position_size = size;
        true
    }

    /// Close the open position and return the realized P&L, or `None` when flat.
    pub fn close(&mut self, price: f64) -> Option<f64> {
        let entry_price = self.position.entry_price()?;
        let proceeds = self.position_size * price;
        let cost = self.position_size * entry_price;
        self.balance += proceeds;
        self.position = PositionState::Flat;
        self.position_size = 0.0;
        Some(proceeds - cost)
    }

    /// Balance plus the market value of any open position.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        if self.position.is_long() {
            self.balance + self.position_size * price
        } else {
            self.balance
        }
    }

    /// Unrealized P&L of the open position, 0 when flat.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.position.entry_price() {
            Some(entry) => self.position_size * (price - entry),
            None => 0.0,
        }
    }
}
