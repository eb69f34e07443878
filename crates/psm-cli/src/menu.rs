use std::io::{BufRead, Write};

use psm_core::{CopySelection, ManagerError, SaveManager, WorldEntry};

use crate::console::{
    BRIGHT, CYAN, Console, GREEN, MAGENTA, MenuError, MenuResult, RED, RESET, WHITE, YELLOW,
};

const CONTINUE: &str = "Press Enter to continue...";

pub struct Menu<R, W> {
    manager: SaveManager,
    console: Console<R, W>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(manager: SaveManager, console: Console<R, W>) -> Self {
        Self { manager, console }
    }

    #[cfg(test)]
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Runs until `Q` or end of input at the main prompt. Ctrl+C inside an
    /// action returns here; at the main prompt it is left to the handler.
    pub fn run(&mut self) -> MenuResult<()> {
        loop {
            self.console.clear_screen()?;
            let worlds = self.render_overview()?;
            let choice = match self.console.ask(BRIGHT, "Enter choice: ") {
                Ok(c) => c.to_ascii_uppercase(),
                Err(MenuError::Cancelled) => return Ok(()),
                Err(e) => return Err(e),
            };
            if choice == "Q" {
                return Ok(());
            }
            let interrupt = self.console.interrupt();
            interrupt.arm();
            let outcome = self.dispatch(&choice, &worlds);
            interrupt.disarm();
            match outcome {
                Ok(()) => {}
                Err(MenuError::Cancelled) => {
                    self.console.say(CYAN, "Returning to menu...")?;
                }
                Err(MenuError::Manager(e)) => {
                    tracing::warn!(error = %e, choice = %choice, "menu action failed");
                    self.console.say(RED, &format!("Error: {}", e))?;
                    self.pause()?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn render_overview(&mut self) -> MenuResult<Vec<WorldEntry>> {
        let rule = "=".repeat(30);
        let header = format!("{}{}", CYAN, BRIGHT);
        self.console.say(&header, &rule)?;
        self.console.say(&header, "Palworld Save Manager")?;
        self.console.say(&header, &rule)?;
        self.console.raw("")?;

        let worlds = match self.manager.worlds() {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list worlds");
                self.console.say(RED, &format!("Error: {}", e))?;
                Vec::new()
            }
        };
        if worlds.is_empty() {
            self.console
                .say(&format!("{}{}", YELLOW, BRIGHT), "No other worlds available.")?;
        } else {
            self.console
                .say(&format!("{}{}", MAGENTA, BRIGHT), "Available Worlds:")?;
            self.list_with_folders(&worlds)?;
        }

        self.console.raw("")?;
        let active = format!(
            "Current active world: {} (Folder: {})",
            self.manager.active_display_name(),
            self.manager.active_id()
        );
        self.console.say(&format!("{}{}", GREEN, BRIGHT), &active)?;
        self.console.raw("")?;

        for (key, label) in [
            ("S", "Switch World"),
            ("N", "New World"),
            ("D", "Delete World"),
            ("U", "Undo Delete"),
            ("C", "Clear Deleted Worlds"),
            ("R", "Rename World"),
            ("L", "Launch Server"),
            ("P", "Paste/Copy Settings and or Mods"),
            ("B", "Back Up World to Zip"),
            ("Q", "Quit"),
        ] {
            self.console
                .raw(&format!("{}[{}]{} {}", BRIGHT, key, RESET, label))?;
        }
        Ok(worlds)
    }

    fn list_with_folders(&mut self, worlds: &[WorldEntry]) -> MenuResult<()> {
        for (i, w) in worlds.iter().enumerate() {
            self.console.raw(&format!(
                "{}{}. {}{} (Folder: {})",
                WHITE,
                i + 1,
                w.display_name,
                RESET,
                w.folder
            ))?;
        }
        Ok(())
    }

    fn list_names(&mut self, worlds: &[WorldEntry]) -> MenuResult<()> {
        for (i, w) in worlds.iter().enumerate() {
            self.console
                .say(WHITE, &format!("{}. {}", i + 1, w.display_name))?;
        }
        Ok(())
    }

    fn pause(&mut self) -> MenuResult<()> {
        self.console.pause(CONTINUE)
    }

    fn dispatch(&mut self, choice: &str, worlds: &[WorldEntry]) -> MenuResult<()> {
        match choice {
            "S" => self.switch(worlds),
            "N" => self.new_world(),
            "D" => self.delete(worlds),
            "U" => self.undo_delete(),
            "C" => self.clear_trash(),
            "R" => self.rename(),
            "L" => self.launch(),
            "P" => self.paste(),
            "B" => self.backup(),
            _ => Ok(()),
        }
    }

    fn switch(&mut self, worlds: &[WorldEntry]) -> MenuResult<()> {
        if worlds.is_empty() {
            self.console.say(YELLOW, "No worlds available to switch!")?;
            return self.pause();
        }
        let idx = self
            .console
            .pick_number("Enter world number to activate: ", worlds.len())?;
        let report = self.manager.switch_to(&worlds[idx].folder)?;
        self.console.say(
            GREEN,
            &format!(
                "Activated world: {} (previous world kept as {})",
                report.activated, report.archived_as
            ),
        )?;
        self.pause()
    }

    fn new_world(&mut self) -> MenuResult<()> {
        let name = self
            .console
            .ask(BRIGHT, "Enter a name for the new world: ")?;
        let report = self.manager.create_world(&name)?;
        self.console.say(
            GREEN,
            &format!("New world created: {}", report.display_name),
        )?;
        self.pause()
    }

    fn delete(&mut self, worlds: &[WorldEntry]) -> MenuResult<()> {
        if worlds.is_empty() {
            self.console.say(YELLOW, "No worlds available to delete!")?;
            return self.pause();
        }
        let idx = self
            .console
            .pick_number("Enter world number to delete: ", worlds.len())?;
        let world = &worlds[idx];
        let prompt = format!(
            "Are you sure you want to DELETE {}? (Y/N) ",
            world.display_name
        );
        if self.console.confirm(&format!("{}{}", YELLOW, BRIGHT), &prompt)? {
            self.manager.trash_world(&world.folder)?;
            self.console
                .say(GREEN, &format!("{} moved to trash.", world.display_name))?;
            self.pause()?;
        }
        Ok(())
    }

    fn undo_delete(&mut self) -> MenuResult<()> {
        let deleted = self.manager.trash()?;
        if deleted.is_empty() {
            self.console.say(YELLOW, "No deleted worlds to undo!")?;
            return self.pause();
        }
        self.console
            .say(&format!("{}{}", MAGENTA, BRIGHT), "Deleted worlds:")?;
        self.list_names(&deleted)?;
        let idx = self
            .console
            .pick_number("Enter number to restore: ", deleted.len())?;
        let restored = self.manager.restore_from_trash(&deleted[idx].folder)?;
        self.console
            .say(GREEN, &format!("Restored world: {}", restored))?;
        self.pause()
    }

    fn clear_trash(&mut self) -> MenuResult<()> {
        let deleted = self.manager.trash()?;
        if deleted.is_empty() {
            self.console.say(YELLOW, "Trash is already empty!")?;
            return self.pause();
        }
        self.console.say(
            &format!("{}{}", MAGENTA, BRIGHT),
            "Deleted worlds to be permanently removed:",
        )?;
        for w in &deleted {
            self.console.say(WHITE, &format!("- {}", w.display_name))?;
        }
        let warning = "YOU WILL LOSE THESE SERVERS FOREVER! CONTINUE? (Y/N) ";
        if self.console.confirm(&format!("{}{}", RED, BRIGHT), warning)? {
            let removed = self.manager.clear_trash()?;
            self.console.say(
                GREEN,
                &format!("Deleted servers cleared permanently! ({} removed)", removed),
            )?;
            self.pause()?;
        }
        Ok(())
    }

    fn rename(&mut self) -> MenuResult<()> {
        let all = self.manager.all_worlds()?;
        self.console.say(&format!("{}{}", MAGENTA, BRIGHT), "Worlds:")?;
        self.list_with_folders(&all)?;
        let idx = self
            .console
            .pick_number("Enter world number to rename: ", all.len())?;
        let world = &all[idx];
        let new_name = self.console.ask(
            BRIGHT,
            &format!("Enter new name for {}: ", world.display_name),
        )?;
        if !new_name.is_empty() {
            self.manager.rename_world(&world.folder, &new_name)?;
            self.console
                .say(GREEN, &format!("World renamed: {}", new_name))?;
        }
        self.pause()
    }

    fn launch(&mut self) -> MenuResult<()> {
        match self.manager.launch_server() {
            Ok(pid) => {
                self.console
                    .say(CYAN, &format!("Launched dedicated server (pid {}).", pid))?;
                self.console.pause("Press Enter to return to menu...")
            }
            Err(ManagerError::ServerNotFound(exe)) => {
                self.console
                    .say(RED, &format!("{} not found!", exe.display()))?;
                self.pause()
            }
            Err(e) => Err(e.into()),
        }
    }

    fn paste(&mut self) -> MenuResult<()> {
        let worlds = match self.manager.worlds() {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list worlds");
                self.console.say(RED, &format!("Error: {}", e))?;
                Vec::new()
            }
        };
        if worlds.is_empty() {
            self.console
                .say(YELLOW, "No other worlds available to copy from!")?;
            return self.pause();
        }
        self.console.say(
            &format!("{}{}", MAGENTA, BRIGHT),
            "Available worlds to copy from:",
        )?;
        self.list_names(&worlds)?;
        let idx = self
            .console
            .pick_number("Enter world number to copy from: ", worlds.len())?;
        let source = &worlds[idx];

        let selection = loop {
            self.console.say(BRIGHT, "[1] Settings only")?;
            self.console.say(BRIGHT, "[2] Mods only")?;
            self.console.say(BRIGHT, "[3] Both Settings and Mods")?;
            match self.console.ask(BRIGHT, "Enter choice: ")?.as_str() {
                "1" => break CopySelection::Settings,
                "2" => break CopySelection::Mods,
                "3" => break CopySelection::Both,
                _ => self.console.say(YELLOW, "Invalid choice!")?,
            }
        };

        let mut what = String::new();
        if selection.settings() {
            what.push_str("settings ");
        }
        if selection.mods() {
            what.push_str("mods ");
        }
        let alert = format!("{}{}", RED, BRIGHT);
        self.console.say(
            &alert,
            &format!(
                "\nWARNING: This will overwrite the active world's {}with the selected world. You may lose your current options!\n",
                what
            ),
        )?;
        if !self.console.confirm(&alert, "Proceed? (Y/N): ")? {
            self.console.say(YELLOW, "Operation cancelled.")?;
            return self.pause();
        }

        let copied = self.manager.copy_into_active(&source.folder, selection)?;
        for item in &copied {
            self.console.say(GREEN, &format!("{} copied.", item))?;
        }
        self.console.say(
            GREEN,
            &format!("Copied from {} to active world.", source.display_name),
        )?;
        self.pause()
    }

    fn backup(&mut self) -> MenuResult<()> {
        let all = self.manager.all_worlds()?;
        self.console.say(&format!("{}{}", MAGENTA, BRIGHT), "Worlds:")?;
        self.list_with_folders(&all)?;
        let idx = self
            .console
            .pick_number("Enter world number to back up: ", all.len())?;
        let zip = self.manager.archive_world(&all[idx].folder)?;
        self.console.say(
            GREEN,
            &format!("Backed up {} to {}", all[idx].display_name, zip.display()),
        )?;
        self.pause()
    }
}
