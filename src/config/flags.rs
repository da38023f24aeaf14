/// Raw flag bits.
///
/// Presentation bits sit in the low 16 bits, behavior bits in the high 16.
/// These constants are shared with the registry rows; public code goes
/// through the named accessors on [`ConfigFlags`].
pub(crate) mod bits {
    pub const SHOW_MESSAGES: u32 = 1 << 0;
    pub const SHOW_COUNTS: u32 = 1 << 1;
    pub const PRINT_ON_PASS: u32 = 1 << 2;
    pub const PRINT_ON_FAIL: u32 = 1 << 3;
    pub const COLOR: u32 = 1 << 4;
    pub const SHOW_TIMESTAMPS: u32 = 1 << 5;
    pub const SHOW_DURATION: u32 = 1 << 6;

    pub const ABORT_ON_FAILURE: u32 = 1 << 16;
    pub const DISABLED: u32 = 1 << 17;
    pub const SHUFFLE: u32 = 1 << 18;
    pub const PARALLEL: u32 = 1 << 19;
}

/// Packed boolean options of a [`Config`](super::Config).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFlags(u32);

macro_rules! flag_accessors {
    ($($get:ident, $set:ident => $bit:expr;)*) => {
        $(
            pub fn $get(&self) -> bool {
                self.get_raw($bit)
            }

            pub fn $set(&mut self, on: bool) {
                self.set_raw($bit, on);
            }
        )*
    };
}

impl ConfigFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub(crate) fn get_raw(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub(crate) fn set_raw(&mut self, bit: u32, on: bool) {
        match on {
            true => self.0 |= bit,
            false => self.0 &= !bit,
        }
    }

    flag_accessors! {
        show_messages, set_show_messages => bits::SHOW_MESSAGES;
        show_counts, set_show_counts => bits::SHOW_COUNTS;
        print_on_pass, set_print_on_pass => bits::PRINT_ON_PASS;
        print_on_fail, set_print_on_fail => bits::PRINT_ON_FAIL;
        color, set_color => bits::COLOR;
        show_timestamps, set_show_timestamps => bits::SHOW_TIMESTAMPS;
        show_duration, set_show_duration => bits::SHOW_DURATION;
        abort_on_failure, set_abort_on_failure => bits::ABORT_ON_FAILURE;
        disabled, set_disabled => bits::DISABLED;
        shuffle, set_shuffle => bits::SHUFFLE;
        parallel, set_parallel => bits::PARALLEL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_independent() {
        let mut flags = ConfigFlags::new();
        flags.set_abort_on_failure(true);
        flags.set_print_on_fail(true);
        assert!(flags.abort_on_failure());
        assert!(flags.print_on_fail());
        assert!(!flags.disabled());

        flags.set_abort_on_failure(false);
        assert!(!flags.abort_on_failure());
        assert!(flags.print_on_fail());
    }

    #[test]
    fn default_is_empty() {
        assert!(ConfigFlags::default().is_empty());
        let mut flags = ConfigFlags::default();
        flags.set_disabled(true);
        assert!(!flags.is_empty());
    }
}
