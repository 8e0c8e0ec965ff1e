use crate::cursor::Endian;

/// Console platforms whose region containers can be read and written.
///
/// The PS3 and its emulator are distinct platforms: dumps taken through
/// the emulator follow slightly different codec conventions than disc
/// saves.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Console {
    Xbox360,
    XboxOne,
    Ps3,
    Rpcs3,
    PsVita,
    Ps4,
    WiiU,
    Switch,
}

impl Console {
    /// Byte order of every integer field in the container.
    ///
    /// Vita saves are little endian, every other platform writes big
    /// endian.
    pub(crate) fn endian(self) -> Endian {
        match self {
            Console::PsVita => Endian::Little,
            _ => Endian::Big,
        }
    }

    /// Amount of 32-bit decompressed length words in a chunk record
    /// header. The PS3 family writes the decompressed length twice.
    pub(crate) fn decompressed_length_words(self) -> usize {
        match self {
            Console::Ps3 | Console::Rpcs3 => 2,
            _ => 1,
        }
    }

    /// Chunk record header length in bytes: the stored length word plus
    /// the decompressed length word(s).
    pub(crate) fn chunk_header_length(self) -> usize {
        4 + 4 * self.decompressed_length_words()
    }
}
