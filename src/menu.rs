// Context-menu model and the host-UI seam. The host renders every
// surface; this module owns what is on the menu and what each entry
// does once chosen.

use std::sync::Arc;

use crate::ops::{Actions, CreateFileRequest, RenameRequest, RenameTarget};

/// Every action reachable from the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    Compress,
    CopyAddress,
    CopyContent,
    CopyNames,
    CreateFile,
    InvertSelection,
    Rename,
    SaySize,
    RobocopyCopy,
    RobocopyMove,
    RobocopyPaste,
    MirrorBackup,
    TxtToFolder,
    Settings,
}

/// One rendered entry. Submenu parents carry children and no item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub item: Option<MenuItem>,
    pub label: &'static str,
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    fn leaf(item: MenuItem, label: &'static str) -> Self {
        Self {
            item: Some(item),
            label,
            children: Vec::new(),
        }
    }

    fn submenu(label: &'static str, children: Vec<MenuEntry>) -> Self {
        Self {
            item: None,
            label,
            children,
        }
    }
}

/// The context menu in its fixed presentation order.
pub fn menu_entries() -> Vec<MenuEntry> {
    vec![
        MenuEntry::leaf(MenuItem::Compress, "Compress"),
        MenuEntry::leaf(MenuItem::CopyAddress, "Copy address bar"),
        MenuEntry::leaf(MenuItem::CopyContent, "Copy content"),
        MenuEntry::leaf(MenuItem::CopyNames, "Copy selected names"),
        MenuEntry::leaf(MenuItem::CreateFile, "Create file"),
        MenuEntry::leaf(MenuItem::InvertSelection, "Invert selection"),
        MenuEntry::leaf(MenuItem::Rename, "Rename"),
        MenuEntry::leaf(MenuItem::SaySize, "Say size"),
        MenuEntry::submenu(
            "Robocopy",
            vec![
                MenuEntry::leaf(MenuItem::RobocopyCopy, "Copy"),
                MenuEntry::leaf(MenuItem::RobocopyMove, "Move"),
                MenuEntry::leaf(MenuItem::RobocopyPaste, "Paste"),
                MenuEntry::leaf(MenuItem::MirrorBackup, "Mirror backup"),
            ],
        ),
        MenuEntry::leaf(MenuItem::TxtToFolder, "TXT to folder"),
        MenuEntry::leaf(MenuItem::Settings, "Settings"),
    ]
}

/// Host-rendered surfaces. Menu and dialog layout stay on the host
/// side; the crate hands over the data model and consumes what the
/// user submitted. A dismissed surface reports None.
pub trait UiHost: Send + Sync {
    fn show_context_menu(
        &self,
        entries: Vec<MenuEntry>,
        on_choice: Box<dyn FnOnce(Option<MenuItem>) + Send>,
    );
    fn open_rename_dialog(
        &self,
        prefill: RenameTarget,
        on_submit: Box<dyn FnOnce(Option<RenameRequest>) + Send>,
    );
    fn open_create_file_dialog(
        &self,
        prefill: CreateFileRequest,
        on_submit: Box<dyn FnOnce(Option<CreateFileRequest>) + Send>,
    );
    fn open_settings(&self);
}

/// Perform one chosen entry. Rename and create-file route back through
/// a host dialog; everything else acts immediately.
pub fn dispatch(item: MenuItem, actions: &Arc<Actions>, ui: &Arc<dyn UiHost>) {
    crate::debug!("[Menu] Dispatching {:?}", item);
    match item {
        MenuItem::Compress => actions.compress(),
        MenuItem::CopyAddress => actions.copy_address(),
        MenuItem::CopyContent => actions.copy_content(),
        MenuItem::CopyNames => actions.copy_names(),
        MenuItem::CreateFile => open_create_file(actions, ui),
        MenuItem::InvertSelection => actions.invert_selection(),
        MenuItem::Rename => open_rename(actions, ui),
        MenuItem::SaySize => actions.say_size(),
        MenuItem::RobocopyCopy => actions.stage_copy(),
        MenuItem::RobocopyMove => actions.stage_move(),
        MenuItem::RobocopyPaste => actions.paste(),
        MenuItem::MirrorBackup => actions.mirror_backup(),
        MenuItem::TxtToFolder => actions.txt_to_folder(),
        MenuItem::Settings => ui.open_settings(),
    }
}

/// Validate the selection, then hand the rename dialog to the host.
/// Invalid selections are announced by the prefill step and open nothing.
pub(crate) fn open_rename(actions: &Arc<Actions>, ui: &Arc<dyn UiHost>) {
    let prefill = match actions.rename_prefill() {
        Some(prefill) => prefill,
        None => return,
    };
    let path = prefill.path.clone();
    let actions = actions.clone();
    ui.open_rename_dialog(
        prefill,
        Box::new(move |submitted| {
            if let Some(request) = submitted {
                actions.apply_rename(&path, &request);
            }
        }),
    );
}

pub(crate) fn open_create_file(actions: &Arc<Actions>, ui: &Arc<dyn UiHost>) {
    let (directory, prefill) = match actions.create_file_prefill() {
        Some(prefill) => prefill,
        None => return,
    };
    let actions = actions.clone();
    ui.open_create_file_dialog(
        prefill,
        Box::new(move |submitted| {
            if let Some(request) = submitted {
                actions.apply_create_files(&directory, &request);
            }
        }),
    );
}

#[cfg(test)]
#[path = "menu_test.rs"]
mod tests;
