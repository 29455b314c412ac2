use core::fmt;

use crate::{BIT_LEN_MACHINE_ID, BIT_LEN_SEQUENCE, BIT_LEN_TIME};

/// The fields of a packed ID, as returned by [`decompose`](crate::decompose).
///
/// `Display` renders the raw ID followed by a table of the four fields, with
/// each value in decimal and hex.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Decomposed {
    /// The packed ID itself.
    pub id: u64,
    /// The most significant bit. Always 0 for IDs produced by this crate.
    pub msb: u8,
    /// Elapsed 10 ms ticks since the generator's start time.
    pub time: u64,
    /// Position of the ID within its tick.
    pub sequence: u8,
    /// Machine ID of the generator that produced the ID.
    pub machine_id: u16,
}

struct Field {
    name: &'static str,
    bits: u32,
    value: u64,
}

impl Decomposed {
    fn fields(&self) -> [Field; 4] {
        [
            Field {
                name: "msb",
                bits: 1,
                value: u64::from(self.msb),
            },
            Field {
                name: "time",
                bits: BIT_LEN_TIME,
                value: self.time,
            },
            Field {
                name: "sequence",
                bits: BIT_LEN_SEQUENCE,
                value: u64::from(self.sequence),
            },
            Field {
                name: "machine_id",
                bits: BIT_LEN_MACHINE_ID,
                value: u64::from(self.machine_id),
            },
        ]
    }
}

impl fmt::Display for Decomposed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn center(s: &str, width: usize) -> String {
            let pad = width.saturating_sub(s.len());
            let left = pad / 2;
            format!("{}{}{}", " ".repeat(left), s, " ".repeat(pad - left))
        }

        let fields = self.fields();
        let rows = fields.each_ref().map(|field| {
            [
                format!("{} ({})", field.name, field.bits),
                field.value.to_string(),
                format!("0x{:x}", field.value),
            ]
        });
        // +2 for padding
        let widths = rows.each_ref().map(|cells| {
            cells.iter().map(String::len).max().unwrap_or_default() + 2
        });

        let border = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            write!(f, "    +")?;
            for w in widths {
                write!(f, "{}+", "-".repeat(w))?;
            }
            writeln!(f)
        };

        writeln!(f, "0x{:016x} ({})", self.id, self.id)?;
        border(f)?;
        for line in 0..3 {
            write!(f, "    |")?;
            for (cells, &w) in rows.iter().zip(&widths) {
                write!(f, "{}|", center(&cells[line], w))?;
            }
            writeln!(f)?;
            if line == 0 {
                border(f)?;
            }
        }
        border(f)
    }
}
