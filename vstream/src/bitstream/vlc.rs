//! Variable-length-code tables

use crate::bitstream::cursor::{Bitstream, Direction};
use crate::error::{Error, Result};
use log::warn;

/// A single codeword of a VLC table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VlcCode<T> {
    /// The value this codeword stands for.
    pub value: T,

    /// How many bits the codeword is made of.
    pub len: u8,

    /// The codeword, right-aligned: the first bit in the stream is bit
    /// `len - 1`.
    pub bits: u32,
}

impl<T> VlcCode<T> {
    pub const fn new(value: T, len: u8, bits: u32) -> Self {
        Self { value, len, bits }
    }

    fn bit(&self, i: u8) -> bool {
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }
}

/// A single node of a decoding trie.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Entry {
    /// This entry represents a successful VLC parse.
    ///
    /// The index refers to the codeword in the table's code list.
    End(usize),

    /// This entry represents a fork in the trie.
    ///
    /// Upon encountering a fork, another bit in the bitstream should be read.
    /// The fork provides a trie index for the entry to consider when the bit
    /// is zero (left) or one (right).
    Fork(usize, usize),

    /// No codeword starts with the bits read so far.
    Invalid,
}

/// A prefix code mapping values of type `T` to codewords.
///
/// Encoding searches the code list for a matching value. Decoding walks a
/// binary trie built from the codes when the table is created, so that every
/// bit read either narrows the candidates or ends the walk.
pub struct VlcTable<T: 'static> {
    codes: &'static [VlcCode<T>],
    trie: Vec<Entry>,
}

impl<T> VlcTable<T> {
    /// Build a table from a static list of codes.
    ///
    /// The codes must form a prefix code. Tables are static data, so a code
    /// list that does not is a programming error and panics.
    pub fn new(codes: &'static [VlcCode<T>]) -> Self {
        let mut trie = vec![Entry::Invalid];

        for (index, code) in codes.iter().enumerate() {
            assert!(code.len > 0 && code.len <= 32, "codeword length out of range");

            let mut node = 0;
            for i in 0..code.len {
                let bit = code.bit(i);
                node = match trie[node] {
                    Entry::Fork(zero, one) => {
                        if bit {
                            one
                        } else {
                            zero
                        }
                    }
                    Entry::Invalid => {
                        let zero = trie.len();
                        trie.push(Entry::Invalid);
                        trie.push(Entry::Invalid);
                        trie[node] = Entry::Fork(zero, zero + 1);
                        if bit {
                            zero + 1
                        } else {
                            zero
                        }
                    }
                    Entry::End(_) => panic!("codeword {} extends another codeword", index),
                };
            }

            assert_eq!(Entry::Invalid, trie[node], "codeword {} is a prefix of another", index);
            trie[node] = Entry::End(index);
        }

        Self { codes, trie }
    }

    pub fn codes(&self) -> &'static [VlcCode<T>] {
        self.codes
    }
}

impl Bitstream {
    /// Transfer a value through a variable-length code table.
    ///
    /// Encoding fails with `InvalidCodeword` if the table has no codeword for
    /// the value. Decoding consumes exactly the bits of the matched codeword,
    /// and fails with `InvalidCodeword` as soon as the bits read so far cannot
    /// start any codeword.
    pub fn vlc<T: PartialEq + Copy>(&mut self, val: &mut T, table: &VlcTable<T>) -> Result<()> {
        match self.direction() {
            Direction::Encode => {
                let code = table
                    .codes
                    .iter()
                    .find(|code| code.value == *val)
                    .ok_or(Error::InvalidCodeword("value has no codeword"))?;

                for i in 0..code.len {
                    self.bit(&mut code.bit(i))?;
                }
            }
            Direction::Decode => {
                let mut index = 0;
                *val = loop {
                    match table.trie[index] {
                        Entry::End(code) => break table.codes[code].value,
                        Entry::Fork(zero, one) => {
                            let mut bit = false;
                            self.bit(&mut bit)?;
                            index = if bit { one } else { zero };
                        }
                        Entry::Invalid => {
                            warn!("no codeword matches at byte {}", self.byte_position());
                            return Err(Error::InvalidCodeword("no codeword matches"));
                        }
                    }
                };
            }
        }

        Ok(())
    }
}
