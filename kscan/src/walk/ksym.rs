use std::io::{self, Write};

use kscan_common::{AddrDelta, KsymRecord, LineBuf, KSYM_HEADER};

use super::{Outcome, SeqFile};
use crate::source::Ksym;

/// Remembers the address of the previously emitted symbol.
#[derive(Debug, Default)]
pub struct DeltaEncoder {
    last_sym_value: u64,
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous address; the next delta will be empty.
    pub fn reset(&mut self) {
        self.last_sym_value = 0;
    }

    pub fn delta(&self, value: u64) -> AddrDelta {
        AddrDelta::between(self.last_sym_value, value)
    }

    pub fn remember(&mut self, value: u64) {
        self.last_sym_value = value;
    }
}

/// Emits the symbol table as `delta` / `entry` line pairs after a header.
pub struct KsymWalker {
    delta: DeltaEncoder,
    line: LineBuf,
}

impl KsymWalker {
    pub fn new() -> Self {
        Self {
            delta: DeltaEncoder::new(),
            line: LineBuf::new(),
        }
    }

    pub fn reset(&mut self) {
        self.delta.reset();
    }

    pub fn visit<W: Write>(
        &mut self,
        seq: u64,
        sym: Option<&Ksym>,
        out: &mut SeqFile<W>,
    ) -> io::Result<Outcome> {
        if seq == 0 {
            out.print_str(KSYM_HEADER)?;
            return Ok(Outcome::HeaderOnly);
        }
        let Some(sym) = sym else {
            return Ok(Outcome::Skipped);
        };

        let delta = self.delta.delta(sym.value);
        let value = if sym.show_value { sym.value } else { 0 };
        self.delta.remember(value);

        let record = KsymRecord {
            delta,
            addr: value,
            atype: sym.kind_code,
            name: sym.name.as_bytes(),
            module: sym.module_name.as_bytes(),
            kind: sym.cursor.classify(),
            max_size: None,
        };

        self.line.clear();
        record.write_delta(&mut self.line);
        out.print(&self.line)?;

        self.line.clear();
        record.write_entry(&mut self.line);
        out.print(&self.line)?;

        Ok(Outcome::Emitted)
    }
}

impl Default for KsymWalker {
    fn default() -> Self {
        Self::new()
    }
}
