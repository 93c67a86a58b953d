//! UI Automation queries against a player or browser window.

use windows::core::VARIANT;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED,
};
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationCondition, IUIAutomationElement,
    IUIAutomationSelectionItemPattern, IUIAutomationValuePattern, TreeScope_Descendants,
    UIA_ControlTypePropertyId, UIA_EditControlTypeId, UIA_SelectionItemPatternId,
    UIA_TabItemControlTypeId, UIA_ValuePatternId, UIA_CONTROLTYPE_ID,
};

use crate::error::StrategyMiss;
use crate::model::{MediaInfo, MediaInfoType, Player};
use crate::strategy::caption_info;

/// Keeps COM initialized on the calling worker thread.
struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    fn new() -> Self {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        Self {
            initialized: hr.is_ok(),
        }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

/// Browser address bar and selected tab, or the title in the window's
/// accessible name for regular players.
pub fn media_info(player: &Player, hwnd: HWND) -> Result<Vec<MediaInfo>, StrategyMiss> {
    let _com = ComGuard::new();
    query(player, hwnd).map_err(|e| StrategyMiss::Query(e.message()))
}

fn query(player: &Player, hwnd: HWND) -> windows::core::Result<Vec<MediaInfo>> {
    let automation: IUIAutomation =
        unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)? };
    let root = unsafe { automation.ElementFromHandle(hwnd)? };

    if !player.is_browser() {
        let name = unsafe { root.CurrentName()? }.to_string();
        return Ok(caption_info(player, &name));
    }

    let mut info = Vec::new();
    if let Some(edit) = find_first(&automation, &root, UIA_EditControlTypeId) {
        let url = unsafe {
            edit.GetCurrentPatternAs::<IUIAutomationValuePattern>(UIA_ValuePatternId)
                .and_then(|pattern| pattern.CurrentValue())
        };
        if let Ok(url) = url {
            push_trimmed(&mut info, MediaInfoType::Url, &url.to_string());
        }
    }

    if let Some(tab) = selected_tab(&automation, &root)? {
        let name = unsafe { tab.CurrentName()? }.to_string();
        push_trimmed(&mut info, MediaInfoType::Tab, &name);
    }
    Ok(info)
}

fn control_type_condition(
    automation: &IUIAutomation,
    control_type: UIA_CONTROLTYPE_ID,
) -> windows::core::Result<IUIAutomationCondition> {
    unsafe {
        automation.CreatePropertyCondition(UIA_ControlTypePropertyId, &VARIANT::from(control_type.0))
    }
}

fn find_first(
    automation: &IUIAutomation,
    root: &IUIAutomationElement,
    control_type: UIA_CONTROLTYPE_ID,
) -> Option<IUIAutomationElement> {
    let condition = control_type_condition(automation, control_type).ok()?;
    unsafe { root.FindFirst(TreeScope_Descendants, &condition) }.ok()
}

fn selected_tab(
    automation: &IUIAutomation,
    root: &IUIAutomationElement,
) -> windows::core::Result<Option<IUIAutomationElement>> {
    let condition = control_type_condition(automation, UIA_TabItemControlTypeId)?;
    let tabs = unsafe { root.FindAll(TreeScope_Descendants, &condition)? };
    for i in 0..unsafe { tabs.Length()? } {
        let tab = unsafe { tabs.GetElement(i)? };
        let selected = unsafe {
            tab.GetCurrentPatternAs::<IUIAutomationSelectionItemPattern>(UIA_SelectionItemPatternId)
        }
        .and_then(|pattern| unsafe { pattern.CurrentIsSelected() })
        .map(|b| b.as_bool())
        .unwrap_or(false);
        if selected {
            return Ok(Some(tab));
        }
    }
    Ok(None)
}

fn push_trimmed(info: &mut Vec<MediaInfo>, info_type: MediaInfoType, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        info.push(MediaInfo::new(info_type, value));
    }
}
