use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use kscan_common::{KsymCursor, ModName, SymName, SymbolKind};

use super::Ksym;

/// Streams `/proc/kallsyms`, tracking the section boundaries the kernel's
/// symbol iterator keeps.
///
/// The table lists core and module symbols first, then the
/// `__builtin__ftrace`, `bpf` and `__builtin__kprobes` pseudo-modules.
pub struct Kallsyms<R> {
    reader: R,
    line: Vec<u8>,
    pos: u64,
    cursor: KsymCursor,
}

impl Kallsyms<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Kallsyms<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            pos: 0,
            cursor: KsymCursor::default(),
        }
    }
}

impl<R: BufRead> Iterator for Kallsyms<R> {
    type Item = io::Result<Ksym>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }

            let raw = self.line.strip_suffix(b"\n").unwrap_or(&self.line);
            let Ok(text) = std::str::from_utf8(raw) else {
                log::debug!(
                    "skipping non-UTF-8 kallsyms line {:?}",
                    String::from_utf8_lossy(raw)
                );
                continue;
            };
            let Some(entry) = parse_line(text) else {
                log::debug!("skipping malformed kallsyms line {text:?}");
                continue;
            };

            self.cursor
                .enter(self.pos, SymbolKind::section_of(entry.module.as_bytes()));
            self.pos += 1;

            return Some(Ok(Ksym {
                value: entry.addr,
                // kptr_restrict prints hidden addresses as zero.
                show_value: entry.addr != 0,
                kind_code: entry.kind,
                name: SymName::from_bytes(entry.name.as_bytes()),
                module_name: ModName::from_bytes(entry.module.as_bytes()),
                cursor: self.cursor,
            }));
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Entry<'a> {
    addr: u64,
    kind: u8,
    name: &'a str,
    module: &'a str,
}

/// `<hex addr> <type> <name>[\t[<module>]]`
fn parse_line(line: &str) -> Option<Entry<'_>> {
    let (head, module) = match line.split_once('\t') {
        Some((head, tail)) => {
            let tail = tail.trim();
            let module = tail.strip_prefix('[')?.strip_suffix(']')?;
            (head, module)
        }
        None => (line, ""),
    };
    let mut parts = head.split_whitespace();
    let addr = u64::from_str_radix(parts.next()?, 16).ok()?;
    let kind = parts.next()?.bytes().next()?;
    let name = parts.next()?;
    Some(Entry {
        addr,
        kind,
        name,
        module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
ffffffff81000000 T _text
ffffffff81001000 T do_one_initcall
ffffffffc0a01000 t ext4_fill_super\t[ext4]
ffffffffc0a02000 t __ftrace_trampoline\t[__builtin__ftrace]
this is not a symbol
ffffffffc0b00000 t bpf_prog_6deef7357e7b4530_sd_fw_egress\t[bpf]
ffffffffc0c00000 t kprobe_insn_page\t[__builtin__kprobes]
";

    #[test]
    fn parses_core_and_module_lines() {
        assert_eq!(
            parse_line("ffffffff81000000 T _text"),
            Some(Entry {
                addr: 0xffffffff81000000,
                kind: b'T',
                name: "_text",
                module: "",
            })
        );
        assert_eq!(
            parse_line("ffffffffc0a01000 t ext4_fill_super\t[ext4]"),
            Some(Entry {
                addr: 0xffffffffc0a01000,
                kind: b't',
                name: "ext4_fill_super",
                module: "ext4",
            })
        );
        assert_eq!(parse_line("zz T broken"), None);
        assert_eq!(parse_line("ffffffff81000000 T"), None);
    }

    #[test]
    fn classifies_by_section() {
        let kinds: Vec<(String, SymbolKind)> = Kallsyms::new(TABLE.as_bytes())
            .map(|s| s.unwrap())
            .map(|s| (s.name.to_string_lossy(), s.cursor.classify()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("_text".to_string(), SymbolKind::Mod),
                ("do_one_initcall".to_string(), SymbolKind::Mod),
                ("ext4_fill_super".to_string(), SymbolKind::Mod),
                ("__ftrace_trampoline".to_string(), SymbolKind::FtraceMod),
                (
                    "bpf_prog_6deef7357e7b4530_sd_fw_egress".to_string(),
                    SymbolKind::Bpf
                ),
                ("kprobe_insn_page".to_string(), SymbolKind::Kprobe),
            ]
        );
    }

    #[test]
    fn non_utf8_lines_are_skipped() {
        let table = b"ffffffff81000000 T _text\nffffffff81000010 T \xc3\x28oops\nffffffff81000020 T _stext\n";
        let names: Vec<String> = Kallsyms::new(&table[..])
            .map(|s| s.unwrap().name.to_string_lossy())
            .collect();
        assert_eq!(names, vec!["_text", "_stext"]);
    }

    #[test]
    fn hidden_addresses_are_not_shown() {
        let table = "0000000000000000 T _text\n0000000000000000 T _stext\n";
        let syms: Vec<Ksym> = Kallsyms::new(table.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(syms.len(), 2);
        assert!(syms.iter().all(|s| !s.show_value));
    }
}
