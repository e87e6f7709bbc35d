//! Draft buffers for the two file slots
//!
//! The store, not its callers, keeps the buffers in sync with the editor:
//! switching slots and taking an upload snapshot both flush the editor
//! into the active slot first.

use crate::draft::encoding::encode_files;
use crate::draft::surface::EditorSurface;
use crate::error::{IdeError, IdeResult};
use crate::session::protocol::{EncodedFiles, ProjectFiles};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Editor text shown when fetching a project's files failed
pub const LOAD_ERROR_TEXT: &str = "// Error fetching code. Try again.";

/// One of the two fixed file slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    #[default]
    Script,
    Markup,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Script, Slot::Markup];

    /// Text shown while the slot's content is being fetched
    pub fn loading_placeholder(&self) -> &'static str {
        match self {
            Self::Script => "// Fetching latest code...",
            Self::Markup => "<!-- Fetching latest code... -->",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Markup => write!(f, "markup"),
        }
    }
}

impl FromStr for Slot {
    type Err = IdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" | "gs" => Ok(Self::Script),
            "markup" | "html" => Ok(Self::Markup),
            other => Err(IdeError::UnknownSlot(other.to_string())),
        }
    }
}

/// Slot contents plus the slot bound to the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftBuffer {
    script: String,
    markup: String,
    active: Slot,
    /// Bumped on every open so late fetch results can be recognised
    #[serde(default)]
    generation: u64,
    /// Slots hold placeholders until the project's files arrive
    #[serde(default)]
    pending: bool,
}

impl DraftBuffer {
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Script => &self.script,
            Slot::Markup => &self.markup,
        }
    }

    fn set(&mut self, slot: Slot, text: String) {
        match slot {
            Slot::Script => self.script = text,
            Slot::Markup => self.markup = text,
        }
    }

    pub fn active(&self) -> Slot {
        self.active
    }

    /// Whether the slots hold real project content
    pub fn is_loaded(&self) -> bool {
        !self.pending
    }

    fn adopt(&mut self, files: ProjectFiles) {
        self.script = files.script;
        self.markup = files.markup;
        self.pending = false;
    }

    /// Both slots as plain files
    pub fn files(&self) -> ProjectFiles {
        ProjectFiles {
            script: self.script.clone(),
            markup: self.markup.clone(),
        }
    }
}

/// Proof of which open a pending fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Draft buffers bound to an editor surface
pub struct DraftBufferStore<S: EditorSurface> {
    buffer: DraftBuffer,
    surface: S,
}

impl<S: EditorSurface> DraftBufferStore<S> {
    /// Empty buffers bound to `surface`
    pub fn new(surface: S) -> Self {
        Self {
            buffer: DraftBuffer::default(),
            surface,
        }
    }

    /// Resume buffers persisted by an earlier run
    pub fn resume(buffer: DraftBuffer, surface: S) -> Self {
        Self { buffer, surface }
    }

    pub fn buffer(&self) -> &DraftBuffer {
        &self.buffer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn active(&self) -> Slot {
        self.buffer.active
    }

    /// Copy the editor content into the active slot
    pub fn flush_active(&mut self) -> IdeResult<()> {
        let text = self.surface.text()?;
        self.buffer.set(self.buffer.active, text);
        Ok(())
    }

    /// Flush, then bind `slot` to the editor
    pub fn switch_slot(&mut self, slot: Slot) -> IdeResult<()> {
        self.flush_active()?;
        self.buffer.active = slot;
        self.surface.set_text(self.buffer.get(slot))?;
        debug!("Switched editor to {}", slot);
        Ok(())
    }

    /// Reset the buffers for a newly opened project.
    ///
    /// With `files` the content is adopted verbatim and no ticket is
    /// returned. Without, both slots show a loading placeholder until
    /// [`complete_load`](Self::complete_load) is called with the ticket.
    pub fn open_project(&mut self, files: Option<ProjectFiles>) -> IdeResult<Option<LoadTicket>> {
        self.buffer.generation += 1;
        self.buffer.active = Slot::Script;

        let ticket = match files {
            Some(files) => {
                self.buffer.adopt(files);
                None
            }
            None => {
                self.buffer.pending = true;
                for slot in Slot::ALL {
                    self.buffer
                        .set(slot, slot.loading_placeholder().to_string());
                }
                Some(LoadTicket {
                    generation: self.buffer.generation,
                })
            }
        };

        self.surface.set_text(self.buffer.get(self.buffer.active))?;
        Ok(ticket)
    }

    /// Adopt fetched files, showing whichever slot is active now.
    ///
    /// Returns false (and changes nothing) if another project was opened
    /// since the ticket was issued.
    pub fn complete_load(&mut self, ticket: LoadTicket, files: ProjectFiles) -> IdeResult<bool> {
        if ticket.generation != self.buffer.generation {
            debug!("Discarding files for a superseded open");
            return Ok(false);
        }
        self.buffer.adopt(files);
        self.surface.set_text(self.buffer.get(self.buffer.active))?;
        Ok(true)
    }

    /// Tell the user the fetch failed.
    ///
    /// The buffers keep their placeholders and stay unloaded, so nothing can
    /// be uploaded until the project is opened again.
    pub fn fail_load(&mut self, ticket: LoadTicket) -> IdeResult<bool> {
        if ticket.generation != self.buffer.generation {
            return Ok(false);
        }
        self.surface.set_text(LOAD_ERROR_TEXT)?;
        Ok(true)
    }

    /// Flush, then return both slots
    fn snapshot(&mut self) -> IdeResult<ProjectFiles> {
        self.flush_active()?;
        Ok(self.buffer.files())
    }

    /// Flush, then return both slots in transfer encoding.
    ///
    /// Fails while the project's files are still missing.
    pub fn snapshot_for_upload(&mut self) -> IdeResult<EncodedFiles> {
        if self.buffer.pending {
            return Err(IdeError::DraftsNotLoaded);
        }
        Ok(encode_files(&self.snapshot()?))
    }

    /// Discard the buffers and clear the editor
    pub fn close(&mut self) -> IdeResult<()> {
        let generation = self.buffer.generation + 1;
        self.buffer = DraftBuffer {
            generation,
            ..DraftBuffer::default()
        };
        self.surface.set_text("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::encoding::decode_files;
    use crate::draft::surface::MemorySurface;

    fn store() -> DraftBufferStore<MemorySurface> {
        DraftBufferStore::new(MemorySurface::new())
    }

    fn files(script: &str, markup: &str) -> ProjectFiles {
        ProjectFiles {
            script: script.into(),
            markup: markup.into(),
        }
    }

    #[test]
    fn open_with_files_adopts_verbatim() {
        let mut store = store();
        let ticket = store.open_project(Some(files("", ""))).unwrap();

        assert!(ticket.is_none());
        assert_eq!(store.active(), Slot::Script);
        assert_eq!(store.buffer().get(Slot::Script), "");
        assert_eq!(store.buffer().get(Slot::Markup), "");
        assert_eq!(store.surface().text().unwrap(), "");
    }

    #[test]
    fn switch_slot_flushes_then_loads() {
        let mut store = store();
        store.open_project(Some(files("s", "m"))).unwrap();

        store.surface_mut().type_text("edited script");
        store.switch_slot(Slot::Markup).unwrap();

        assert_eq!(store.surface().text().unwrap(), "m");
        assert_eq!(store.buffer().get(Slot::Script), "edited script");

        store.surface_mut().type_text("edited markup");
        store.switch_slot(Slot::Script).unwrap();
        assert_eq!(store.surface().text().unwrap(), "edited script");
        assert_eq!(store.buffer().get(Slot::Markup), "edited markup");
    }

    #[test]
    fn slots_never_leak_into_each_other() {
        let mut store = store();
        store.open_project(Some(files("", ""))).unwrap();

        let mut expected = files("", "");
        let mut seed: u32 = 0x2545_f491;
        for step in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let active = store.active();
            if seed % 3 == 0 {
                let text = format!("{}-edit-{}", active, step);
                store.surface_mut().type_text(&text);
                match active {
                    Slot::Script => expected.script = text,
                    Slot::Markup => expected.markup = text,
                }
            }
            let target = if (seed >> 8) % 2 == 0 {
                Slot::Script
            } else {
                Slot::Markup
            };
            store.switch_slot(target).unwrap();

            for slot in Slot::ALL {
                let content = store.buffer().get(slot);
                assert!(
                    content.is_empty() || content.starts_with(&slot.to_string()),
                    "{} holds {:?}",
                    slot,
                    content
                );
            }
        }

        assert_eq!(store.snapshot().unwrap(), expected);
    }

    #[test]
    fn snapshot_flushes_active_slot() {
        let mut store = store();
        store.open_project(Some(files("old", "<p></p>"))).unwrap();
        store.surface_mut().type_text("Logger.log('ñ');\nreturn 1;");

        let encoded = store.snapshot_for_upload().unwrap();

        let decoded = decode_files(&encoded).unwrap();
        assert_eq!(decoded.script, "Logger.log('ñ');\nreturn 1;");
        assert_eq!(decoded.markup, "<p></p>");
    }

    #[test]
    fn open_without_files_shows_placeholders() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap();

        assert!(ticket.is_some());
        assert_eq!(
            store.surface().text().unwrap(),
            Slot::Script.loading_placeholder()
        );
        assert_eq!(
            store.buffer().get(Slot::Markup),
            Slot::Markup.loading_placeholder()
        );
    }

    #[test]
    fn complete_load_shows_slot_active_at_resolution() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap().unwrap();
        store.switch_slot(Slot::Markup).unwrap();

        assert!(store
            .complete_load(ticket, files("fetched js", "fetched html"))
            .unwrap());

        assert_eq!(store.active(), Slot::Markup);
        assert_eq!(store.surface().text().unwrap(), "fetched html");
        assert_eq!(store.buffer().get(Slot::Script), "fetched js");
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut store = store();
        let stale = store.open_project(None).unwrap().unwrap();
        store.open_project(Some(files("second", ""))).unwrap();

        assert!(!store.complete_load(stale, files("first", "")).unwrap());
        assert!(!store.fail_load(stale).unwrap());
        assert_eq!(store.surface().text().unwrap(), "second");
    }

    #[test]
    fn fail_load_shows_error_and_keeps_buffers() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap().unwrap();

        assert!(store.fail_load(ticket).unwrap());
        assert_eq!(store.surface().text().unwrap(), LOAD_ERROR_TEXT);
        assert_eq!(
            store.buffer().get(Slot::Script),
            Slot::Script.loading_placeholder()
        );
    }

    #[test]
    fn close_discards_everything() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap().unwrap();
        store.close().unwrap();

        assert_eq!(store.buffer().get(Slot::Script), "");
        assert_eq!(store.surface().text().unwrap(), "");
        assert!(!store.complete_load(ticket, files("late", "")).unwrap());
    }

    #[test]
    fn upload_refused_until_files_arrive() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap().unwrap();
        store.surface_mut().type_text("typed over the placeholder");

        assert!(matches!(
            store.snapshot_for_upload(),
            Err(IdeError::DraftsNotLoaded)
        ));

        store.complete_load(ticket, files("real", "<p/>")).unwrap();
        assert!(store.buffer().is_loaded());
        let decoded = decode_files(&store.snapshot_for_upload().unwrap()).unwrap();
        assert_eq!(decoded.script, "real");
    }

    #[test]
    fn failed_load_stays_unloaded_across_reload() {
        let mut store = store();
        let ticket = store.open_project(None).unwrap().unwrap();
        store.fail_load(ticket).unwrap();

        let json = serde_json::to_string(store.buffer()).unwrap();
        let mut resumed =
            DraftBufferStore::resume(serde_json::from_str(&json).unwrap(), MemorySurface::new());
        assert!(!resumed.buffer().is_loaded());
        assert!(matches!(
            resumed.snapshot_for_upload(),
            Err(IdeError::DraftsNotLoaded)
        ));

        resumed.open_project(Some(files("again", ""))).unwrap();
        assert!(resumed.snapshot_for_upload().is_ok());
    }

    #[test]
    fn slot_parsing() {
        assert_eq!("script".parse::<Slot>().unwrap(), Slot::Script);
        assert_eq!("html".parse::<Slot>().unwrap(), Slot::Markup);
        assert!(matches!(
            "css".parse::<Slot>(),
            Err(IdeError::UnknownSlot(_))
        ));
    }
}
