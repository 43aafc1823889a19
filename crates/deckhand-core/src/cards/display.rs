use std::io::{self, Write};

use crate::cards::card::Card;

/// Rendering collaborator for card lists (pools, packs, decks).
pub trait CardDisplay {
    fn display_cards(&mut self, title: &str, cards: &[Card]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl CardDisplay for NullDisplay {
    fn display_cards(&mut self, _title: &str, _cards: &[Card]) -> io::Result<()> {
        Ok(())
    }
}

/// Writes card names in fixed-width rows.
#[derive(Debug)]
pub struct TextDisplay<W> {
    writer: W,
    row_size: usize,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self::with_row_size(writer, 5)
    }

    pub fn with_row_size(writer: W, row_size: usize) -> Self {
        Self {
            writer,
            row_size: row_size.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CardDisplay for TextDisplay<W> {
    fn display_cards(&mut self, title: &str, cards: &[Card]) -> io::Result<()> {
        writeln!(self.writer, "{title} ({} cards)", cards.len())?;
        for row in cards.chunks(self.row_size) {
            let names: Vec<String> = row.iter().map(|card| format!("{card:<28}")).collect();
            writeln!(self.writer, "  {}", names.join(" ").trim_end())?;
        }
        self.writer.flush()
    }
}
