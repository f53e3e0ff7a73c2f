use std::fmt;
use std::path::Path;

use goblin::Object;
use goblin::mach::Mach;

/// Summary of the executable format of a host binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFormat {
    /// Short name, e.g. "ELF" or "PE".
    pub format_name: &'static str,
    /// Machine architecture identifier as stored in the header.
    pub machine: u32,
    pub is_64: bool,
    /// True for executables (as opposed to objects or libraries).
    pub is_executable: bool,
}

impl HostFormat {
    /// Parses the headers of `bytes`. Trailing data such as an appended
    /// metadata block does not affect the result.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match Object::parse(bytes) {
            Ok(Object::Elf(elf)) => Some(Self {
                format_name: "ELF",
                machine: u32::from(elf.header.e_machine),
                is_64: elf.is_64,
                is_executable: elf.header.e_type == goblin::elf::header::ET_EXEC
                    || elf.interpreter.is_some(),
            }),
            Ok(Object::PE(pe)) => Some(Self {
                format_name: "PE",
                machine: u32::from(pe.header.coff_header.machine),
                is_64: pe.is_64,
                is_executable: !pe.is_lib,
            }),
            Ok(Object::Mach(Mach::Binary(macho))) => Some(Self {
                format_name: "Mach-O",
                machine: macho.header.cputype,
                is_64: macho.is_64,
                is_executable: macho.header.filetype == goblin::mach::header::MH_EXECUTE,
            }),
            Ok(_) => None,
            Err(err) => {
                log::debug!("host is not a recognized executable: {err}");
                None
            }
        }
    }

    pub fn of_file(path: &Path) -> Option<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Self::detect(&bytes),
            Err(err) => {
                log::debug!("cannot read {}: {err}", path.display());
                None
            }
        }
    }
}

impl fmt::Display for HostFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-bit machine={:#x}{}",
            self.format_name,
            if self.is_64 { 64 } else { 32 },
            self.machine,
            if self.is_executable { " executable" } else { "" }
        )
    }
}
