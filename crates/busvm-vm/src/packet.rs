//! The bus packet currently being dispatched.
//!
//! Owned by the transport layer; the evaluator only reads it.

/// Frame flag: packet is a command to the service (otherwise a report).
pub const FRAME_FLAG_COMMAND: u8 = 0x01;

pub const CMD_GET_REG: u32 = 0x1000;
pub const CMD_SET_REG: u32 = 0x2000;
pub const CMD_EVENT_MASK: u32 = 0x8000;
pub const CMD_EVENT_CODE_MASK: u32 = 0xff;
pub const CMD_REG_CODE_MASK: u32 = 0x0fff;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub flags: u8,
    pub service_size: u32,
    pub service_command: u32,
    pub data: Vec<u8>,
}

impl Packet {
    pub fn report(service_command: u32, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            flags: 0,
            service_size: data.len() as u32,
            service_command,
            data,
        }
    }

    pub fn command(service_command: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            flags: FRAME_FLAG_COMMAND,
            ..Self::report(service_command, data)
        }
    }

    #[inline]
    pub fn is_command(&self) -> bool {
        self.flags & FRAME_FLAG_COMMAND != 0
    }

    #[inline]
    pub fn is_report(&self) -> bool {
        !self.is_command()
    }

    #[inline]
    pub fn is_event(&self) -> bool {
        self.is_report() && self.service_command & CMD_EVENT_MASK != 0
    }

    #[inline]
    pub fn event_code(&self) -> u32 {
        self.service_command & CMD_EVENT_CODE_MASK
    }

    #[inline]
    pub fn is_register_get(&self) -> bool {
        self.service_command >> 12 == CMD_GET_REG >> 12
    }

    #[inline]
    pub fn reg_code(&self) -> u32 {
        self.service_command & CMD_REG_CODE_MASK
    }

    /// Payload bytes, clamped to both `service_size` and the stored data.
    pub fn payload(&self) -> &[u8] {
        let n = (self.service_size as usize).min(self.data.len());
        &self.data[..n]
    }

    /// NUL-terminated match of `s` at `offset`.
    ///
    /// True only if `s` followed by a zero byte fits within `service_size`
    /// and matches the data there. Out-of-range offsets simply yield false.
    pub fn str0_eq(&self, offset: usize, s: &[u8]) -> bool {
        let end = match offset.checked_add(s.len()) {
            Some(end) => end,
            None => return false,
        };
        end < self.service_size as usize
            && self.data.get(end) == Some(&0)
            && self.data.get(offset..end) == Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let ev = Packet::report(CMD_EVENT_MASK | 0x01, vec![]);
        assert!(ev.is_report() && ev.is_event());
        assert_eq!(ev.event_code(), 1);

        let get = Packet::report(CMD_GET_REG | 0x101, vec![0; 4]);
        assert!(get.is_register_get() && !get.is_event());
        assert_eq!(get.reg_code(), 0x101);

        let cmd = Packet::command(0x80, vec![]);
        assert!(cmd.is_command() && !cmd.is_event());
    }

    #[test]
    fn test_str0_eq() {
        let mut pkt = Packet::report(0, b"xab\0z".to_vec());
        assert!(pkt.str0_eq(1, b"ab"));
        assert!(!pkt.str0_eq(1, b"aX"));
        assert!(!pkt.str0_eq(0, b"xa"));
        assert!(!pkt.str0_eq(usize::MAX, b"ab"));
        pkt.service_size = 3;
        assert!(!pkt.str0_eq(1, b"ab"));
        pkt.service_size = 4;
        assert!(pkt.str0_eq(1, b"ab"));
    }

    #[test]
    fn test_payload_clamped() {
        let mut pkt = Packet::report(0, vec![1, 2, 3]);
        pkt.service_size = 10;
        assert_eq!(pkt.payload(), &[1, 2, 3]);
        pkt.service_size = 1;
        assert_eq!(pkt.payload(), &[1]);
    }
}
