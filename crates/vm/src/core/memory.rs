use intcode_config::DEFAULT_MEMORY_LIMIT;

use crate::error::Error;

use super::opcodes::ParameterMode;

/// The [`Memory`] struct represents the memory of an intcode VM.
///
/// Memory is a growable array of signed words. Any non-negative address below the limit may be
/// read or written: accessing an address beyond the current extent grows the backing store,
/// zero-filling the gap. Memory never shrinks.
///
/// Growth is bounded. Reading or writing an address at or beyond [`Memory::limit`] fails with
/// [`Error::AddressOutOfRange`] instead of growing the store. The limit defaults to
/// [`DEFAULT_MEMORY_LIMIT`] (2^24 words) and is set per VM from `Configuration::memory_limit`.
///
/// ```
/// use intcode_vm::{core::memory::Memory, Error};
///
/// let mut memory = Memory::with_limit(&[99], 8);
/// assert_eq!(memory.read(7).expect("below the limit"), 0);
/// assert_eq!(memory.size(), 8);
///
/// assert!(matches!(memory.read(8), Err(Error::AddressOutOfRange { address: 8, limit: 8 })));
/// assert_eq!(memory.size(), 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    /// Vector storing memory words
    pub memory: Vec<i64>,

    /// Addresses at or beyond this limit fault instead of growing the store
    limit: usize,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl Memory {
    /// Creates a new [`Memory`] holding an independent copy of `program`.
    ///
    /// ```
    /// use intcode_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new(&[1, 0, 0, 0, 99]);
    /// assert_eq!(memory.size(), 5);
    /// ```
    pub fn new(program: &[i64]) -> Memory {
        Self::with_limit(program, DEFAULT_MEMORY_LIMIT)
    }

    /// Creates a new [`Memory`] holding a copy of `program`, refusing to grow past `limit` words.
    pub fn with_limit(program: &[i64], limit: usize) -> Memory {
        Memory { memory: program.to_vec(), limit: limit.max(program.len()) }
    }

    /// Gets the current size of the memory in words.
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    /// The number of words this memory may grow to.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the number of words this memory may grow to. The limit never drops below the
    /// current size.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(self.memory.len());
    }

    /// Validates `address` and converts it to an index, without touching the store.
    ///
    /// ```
    /// use intcode_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new(&[]);
    /// assert_eq!(memory.check(7).expect("valid address"), 7);
    /// assert!(memory.check(-1).is_err());
    /// ```
    pub fn check(&self, address: i64) -> Result<usize, Error> {
        if address < 0 {
            return Err(Error::NegativeAddress(address));
        }

        match usize::try_from(address) {
            Ok(index) if index < self.limit => Ok(index),
            _ => Err(Error::AddressOutOfRange { address, limit: self.limit }),
        }
    }

    /// Extends the memory so that `index` is addressable, if necessary.
    fn extend(&mut self, index: usize) {
        if index >= self.memory.len() {
            self.memory.resize(index + 1, 0);
        }
    }

    /// Reads the word at `address`, growing the memory if the address lies beyond its extent.
    ///
    /// ```
    /// use intcode_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(&[1, 2, 3]);
    /// assert_eq!(memory.read(1).expect("read failed"), 2);
    /// assert_eq!(memory.read(1000).expect("read failed"), 0);
    /// assert_eq!(memory.size(), 1001);
    /// ```
    pub fn read(&mut self, address: i64) -> Result<i64, Error> {
        let index = self.check(address)?;
        self.extend(index);
        Ok(self.memory[index])
    }

    /// Writes `value` at `address`, growing the memory if the address lies beyond its extent.
    ///
    /// ```
    /// use intcode_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(&[]);
    /// memory.write(3, 42).expect("write failed");
    /// assert_eq!(memory.memory, vec![0, 0, 0, 42]);
    /// ```
    pub fn write(&mut self, address: i64, value: i64) -> Result<(), Error> {
        let index = self.check(address)?;
        self.extend(index);
        self.memory[index] = value;
        Ok(())
    }

    /// Returns the word at `address` without growing the memory. Unwritten and out-of-range
    /// addresses read as 0.
    pub fn get(&self, address: i64) -> i64 {
        usize::try_from(address).ok().and_then(|index| self.memory.get(index)).copied().unwrap_or(0)
    }

    /// Resolves the value of parameter `parameter` of the instruction at `ip`.
    ///
    /// ```
    /// use intcode_vm::core::{memory::Memory, opcodes::ParameterMode};
    ///
    /// let mut memory = Memory::new(&[4, 3, 99, 42]);
    /// assert_eq!(memory.resolve_read(0, 0, ParameterMode::Position, 0).expect("!"), 42);
    /// assert_eq!(memory.resolve_read(0, 0, ParameterMode::Immediate, 0).expect("!"), 3);
    /// assert_eq!(memory.resolve_read(0, 0, ParameterMode::Relative, -1).expect("!"), 99);
    /// ```
    pub fn resolve_read(
        &mut self,
        ip: i64,
        parameter: usize,
        mode: ParameterMode,
        relative_base: i64,
    ) -> Result<i64, Error> {
        let word = self.read(parameter_address(ip, parameter))?;
        match mode {
            ParameterMode::Position => self.read(word),
            ParameterMode::Immediate => Ok(word),
            ParameterMode::Relative => self.read(relative_base.saturating_add(word)),
        }
    }

    /// Resolves the address that parameter `parameter` of the instruction at `ip` writes to.
    /// Immediate mode cannot be written to.
    pub fn resolve_write_address(
        &mut self,
        ip: i64,
        parameter: usize,
        mode: ParameterMode,
        relative_base: i64,
    ) -> Result<i64, Error> {
        match mode {
            ParameterMode::Position => self.read(parameter_address(ip, parameter)),
            ParameterMode::Relative => {
                let offset = self.read(parameter_address(ip, parameter))?;
                Ok(relative_base.saturating_add(offset))
            }
            ParameterMode::Immediate => Err(Error::InvalidWriteMode { parameter }),
        }
    }
}

/// The address of the word holding parameter `parameter` of the instruction at `ip`. Saturating
/// arithmetic keeps out-of-range addresses out of range, so they fault in [`Memory::check`].
#[inline]
fn parameter_address(ip: i64, parameter: usize) -> i64 {
    ip.saturating_add(parameter as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_is_copied() {
        let program = vec![1, 2, 3];
        let mut memory = Memory::new(&program);
        memory.write(0, 7).expect("write failed");
        assert_eq!(program, vec![1, 2, 3]);
        assert_eq!(memory.memory, vec![7, 2, 3]);
    }

    #[test]
    fn test_write_then_read() {
        let mut memory = Memory::new(&[0; 4]);
        for (address, value) in [(0, 5), (3, -9), (2, i64::MAX), (3, 11)] {
            memory.write(address, value).expect("write failed");
            assert_eq!(memory.read(address).expect("read failed"), value);
        }
        assert_eq!(memory.memory, vec![5, 0, i64::MAX, 11]);
    }

    #[test]
    fn test_read_far_beyond_extent() {
        let mut memory = Memory::new(&[1, 2]);
        assert_eq!(memory.read(100_000).expect("read failed"), 0);
        assert_eq!(memory.size(), 100_001);
        assert!(memory.memory[2..].iter().all(|word| *word == 0));
    }

    #[test]
    fn test_get_does_not_extend() {
        let memory = Memory::new(&[1, 2]);
        assert_eq!(memory.get(1), 2);
        assert_eq!(memory.get(50), 0);
        assert_eq!(memory.get(-4), 0);
        assert_eq!(memory.size(), 2);
    }

    #[test]
    fn test_negative_address() {
        let mut memory = Memory::new(&[1, 2]);
        assert!(matches!(memory.read(-1), Err(Error::NegativeAddress(-1))));
        assert!(matches!(memory.write(-3, 0), Err(Error::NegativeAddress(-3))));
        assert_eq!(memory.size(), 2);
    }

    #[test]
    fn test_memory_limit() {
        let mut memory = Memory::with_limit(&[1, 2], 8);
        assert!(memory.write(7, 1).is_ok());
        assert!(matches!(
            memory.read(8),
            Err(Error::AddressOutOfRange { address: 8, limit: 8 })
        ));
        assert_eq!(memory.size(), 8);
    }

    #[test]
    fn test_limit_never_below_program() {
        let memory = Memory::with_limit(&[1, 2, 3, 4], 2);
        assert_eq!(memory.limit(), 4);
    }

    #[test]
    fn test_default_limit_bounds_growth() {
        let mut memory = Memory::new(&[99]);
        assert_eq!(memory.limit(), DEFAULT_MEMORY_LIMIT);

        let address = DEFAULT_MEMORY_LIMIT as i64;
        assert!(matches!(
            memory.read(address),
            Err(Error::AddressOutOfRange { limit: DEFAULT_MEMORY_LIMIT, .. })
        ));
        assert!(memory.write(address, 1).is_err());
        assert_eq!(memory.size(), 1);
    }

    #[test]
    fn test_resolve_write_address() {
        let mut memory = Memory::new(&[1101, 1, 2, 5]);
        assert_eq!(memory.resolve_write_address(0, 2, ParameterMode::Position, 0).expect("!"), 5);
        assert_eq!(memory.resolve_write_address(0, 2, ParameterMode::Relative, 10).expect("!"), 15);
        assert!(matches!(
            memory.resolve_write_address(0, 2, ParameterMode::Immediate, 0),
            Err(Error::InvalidWriteMode { parameter: 2 })
        ));
    }

    #[test]
    fn test_resolve_negative_relative_address() {
        let mut memory = Memory::new(&[204, -5]);
        assert!(matches!(
            memory.resolve_read(0, 0, ParameterMode::Relative, 2),
            Err(Error::NegativeAddress(-3))
        ));
    }
}
