//! Bus addresses for ModLink controllers

/// A controller address on the bus
///
/// Addresses are numbered as follows: 0 is broadcast, 1 is the prime
/// controller, 2 is the base system controller, and 3 and above are module
/// controllers, ordered by ascending physical position. A source address of
/// 0 is also used by a controller that does not yet know its own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Addr {
    /// All controllers (or "unknown" when used as a source)
    Broadcast,
    /// The prime controller
    Prime,
    /// The base system controller
    BaseSystem,
    /// A module controller at the given bus address (3 and up)
    Module(u8),
}

// Wire format values
const ADDR_BROADCAST: u8 = 0;
const ADDR_PRIME: u8 = 1;
const ADDR_BASE_SYSTEM: u8 = 2;

impl Addr {
    /// Interpret a raw address byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            ADDR_BROADCAST => Addr::Broadcast,
            ADDR_PRIME => Addr::Prime,
            ADDR_BASE_SYSTEM => Addr::BaseSystem,
            addr => Addr::Module(addr),
        }
    }

    /// Convert to the raw address byte sent on the bus
    pub fn to_byte(self) -> u8 {
        match self {
            Addr::Broadcast => ADDR_BROADCAST,
            Addr::Prime => ADDR_PRIME,
            Addr::BaseSystem => ADDR_BASE_SYSTEM,
            Addr::Module(addr) => addr,
        }
    }

    /// Returns true for the broadcast address
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Addr::Broadcast)
    }

    /// Returns true if this addresses a module controller
    pub fn is_module(&self) -> bool {
        matches!(self, Addr::Module(_))
    }
}
