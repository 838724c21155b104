//! Filename suffix to external converter lookup.
//!
//! Files outside the PNM family are piped through a converter program
//! that writes PNM/PAM to its standard output. The table is ordered and
//! the first entry whose suffix ends the filename wins, so compound
//! suffixes (`.pnm.gz`) must be registered before shorter ones that
//! would also match.

/// One converter: a program plus fixed arguments. The source filename is
/// appended as the final, separate argument at spawn time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converter {
    pub suffix: String,
    pub program: String,
    pub args: Vec<String>,
}

impl Converter {
    pub fn new(suffix: &str, program: &str, args: &[&str]) -> Self {
        Self {
            suffix: suffix.to_owned(),
            program: program.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    /// Human-readable command line for diagnostics. Never executed by a shell.
    pub fn display_command(&self, name: &str) -> String {
        let mut cmd = self.program.clone();
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        cmd.push_str(" \"");
        cmd.push_str(name);
        cmd.push('"');
        cmd
    }
}

/// Ordered suffix table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConverterTable {
    entries: Vec<Converter>,
}

const GZIP: (&str, &[&str]) = ("gzip", &["-cd"]);
const BZIP2: (&str, &[&str]) = ("bzip2", &["-cd"]);
const PSTOPNM: (&str, &[&str]) = ("pstopnm", &["-stdout", "-portrait", "-pgm"]);

impl Default for ConverterTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for suffix in [".pnm.gz", ".pbm.gz", ".pgm.gz", ".ppm.gz", ".pam.gz"] {
            table.push(Converter::new(suffix, GZIP.0, GZIP.1));
        }
        for suffix in [".pnm.bz2", ".pbm.bz2", ".pgm.bz2", ".ppm.bz2", ".pam.bz2"] {
            table.push(Converter::new(suffix, BZIP2.0, BZIP2.1));
        }
        table.push(Converter::new(".jpg", "djpeg", &["-gray", "-pnm"]));
        table.push(Converter::new(".jpeg", "djpeg", &["-gray", "-pnm"]));
        table.push(Converter::new(".gif", "giftopnm", &["-image=all"]));
        table.push(Converter::new(".bmp", "bmptoppm", &[]));
        table.push(Converter::new(".tiff", "tifftopnm", &[]));
        table.push(Converter::new(".png", "pngtopnm", &[]));
        table.push(Converter::new(".ps", PSTOPNM.0, PSTOPNM.1));
        table.push(Converter::new(".eps", PSTOPNM.0, PSTOPNM.1));
        table.push(Converter::new(".fig", "fig2dev", &["-L", "ppm", "-m", "3"]));
        table.push(Converter::new(".pdf", "pdftoppm", &["-r", "300", "-gray"]));
        table
    }
}

impl ConverterTable {
    /// A table with no entries: every file is read as native PNM.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. Entries pushed earlier take precedence.
    pub fn push(&mut self, converter: Converter) -> &mut Self {
        self.entries.push(converter);
        self
    }

    pub fn entries(&self) -> &[Converter] {
        &self.entries
    }

    /// First converter whose suffix ends `name`, or `None` for native input.
    pub fn resolve(&self, name: &str) -> Option<&Converter> {
        self.entries.iter().find(|c| name.ends_with(c.suffix.as_str()))
    }
}
