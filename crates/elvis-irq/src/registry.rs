use log::debug;
use spin::Mutex;

use crate::{IrqChannel, ReserveError};

/// One (channel, IRQ number) pair currently in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub channel: IrqChannel,
    pub number: u8,
}

/// Process-wide record of which channels and IRQ numbers are taken.
///
/// No two reservations share a number, and no two share a channel. The
/// list is ordered the way entries are inserted: a new entry goes right
/// after the head, so the first reservation stays first.
pub struct IrqRegistry {
    reserved: Mutex<Vec<Reservation>>,
}

impl Default for IrqRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqRegistry {
    pub const fn new() -> Self {
        Self {
            reserved: Mutex::new(Vec::new()),
        }
    }

    /// Checks whether `channel` or `number` is already taken.
    ///
    /// Entries are scanned in order and on each entry the number is tested
    /// before the channel, so an entry matching both reports the number.
    pub fn check_reserved(&self, channel: IrqChannel, number: u8) -> Result<(), ReserveError> {
        scan(&self.reserved.lock(), channel, number)
    }

    /// Records a reservation without checking for conflicts.
    pub fn add_reserved(&self, channel: IrqChannel, number: u8) {
        insert(&mut self.reserved.lock(), Reservation { channel, number });
        debug!("reserved IRQ{number} for {channel}");
    }

    /// Checks and records under one lock.
    pub fn reserve(&self, channel: IrqChannel, number: u8) -> Result<(), ReserveError> {
        let mut reserved = self.reserved.lock();
        scan(&reserved, channel, number)?;
        insert(&mut reserved, Reservation { channel, number });
        debug!("reserved IRQ{number} for {channel}");
        Ok(())
    }

    /// Removes the first entry holding `number`. Absent numbers are a no-op.
    pub fn remove_reserved(&self, number: u8) -> Option<Reservation> {
        let mut reserved = self.reserved.lock();
        let index = reserved.iter().position(|r| r.number == number)?;
        let removed = reserved.remove(index);
        debug!("released IRQ{number} from {}", removed.channel);
        Some(removed)
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.reserved.lock().clone()
    }

    pub fn channel_number(&self, channel: IrqChannel) -> Option<u8> {
        self.reserved
            .lock()
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| r.number)
    }

    pub fn is_reserved_channel(&self, channel: IrqChannel) -> bool {
        self.channel_number(channel).is_some()
    }

    pub fn len(&self) -> usize {
        self.reserved.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.lock().is_empty()
    }
}

fn scan(reserved: &[Reservation], channel: IrqChannel, number: u8) -> Result<(), ReserveError> {
    for r in reserved {
        if r.number == number {
            return Err(ReserveError::NumberNotUsable(number));
        }
        if r.channel == channel {
            return Err(ReserveError::ChannelNotUsable(channel));
        }
    }
    Ok(())
}

fn insert(reserved: &mut Vec<Reservation>, reservation: Reservation) {
    if reserved.is_empty() {
        reserved.push(reservation);
    } else {
        reserved.insert(1, reservation);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use IrqChannel::*;

    #[test]
    fn test_empty_accepts_anything() {
        let registry = IrqRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.check_reserved(DioA0, 2), Ok(()));
    }

    #[test]
    fn test_number_conflict() {
        let registry = IrqRegistry::new();
        registry.add_reserved(DioA0, 2);
        assert_eq!(
            registry.check_reserved(Button0, 2),
            Err(ReserveError::NumberNotUsable(2))
        );
    }

    #[test]
    fn test_channel_conflict() {
        let registry = IrqRegistry::new();
        registry.add_reserved(DioA0, 2);
        assert_eq!(
            registry.check_reserved(DioA0, 5),
            Err(ReserveError::ChannelNotUsable(DioA0))
        );
    }

    #[test]
    fn test_number_reported_before_channel() {
        let registry = IrqRegistry::new();
        registry.add_reserved(DioA0, 2);
        assert_eq!(
            registry.check_reserved(DioA0, 2),
            Err(ReserveError::NumberNotUsable(2))
        );
    }

    #[test]
    fn test_first_matching_entry_decides() {
        let registry = IrqRegistry::new();
        registry.add_reserved(Button0, 3);
        registry.add_reserved(DioA1, 4);
        // Head is Button0/3, DioA1/4 follows. Head matches the channel first.
        assert_eq!(
            registry.check_reserved(Button0, 4),
            Err(ReserveError::ChannelNotUsable(Button0))
        );
    }

    #[test]
    fn test_insert_after_head() {
        let registry = IrqRegistry::new();
        registry.add_reserved(AiA0, 1);
        registry.add_reserved(DioA0, 2);
        registry.add_reserved(Button0, 3);

        let numbers: Vec<u8> = registry.reservations().iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 3, 2]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = IrqRegistry::new();
        registry.add_reserved(DioA0, 2);
        registry.add_reserved(Button0, 3);

        assert_eq!(
            registry.remove_reserved(2),
            Some(Reservation {
                channel: DioA0,
                number: 2
            })
        );
        assert_eq!(registry.remove_reserved(2), None);
        assert_eq!(registry.remove_reserved(7), None);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.check_reserved(DioA0, 2), Ok(()));
    }

    #[test]
    fn test_reserve_is_checked() {
        let registry = IrqRegistry::new();
        registry.reserve(Timer0, 0).unwrap();
        assert_eq!(
            registry.reserve(Timer0, 0),
            Err(ReserveError::NumberNotUsable(0))
        );
        assert!(registry.is_reserved_channel(Timer0));
        assert_eq!(registry.channel_number(Timer0), Some(0));
        assert_eq!(registry.len(), 1);
    }
}
