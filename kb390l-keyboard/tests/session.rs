//! Session behaviour against a scripted device: framing, caching, staging
//! and saving

mod common;

use kb390l_keyboard::{
    ButtonAction, KeyIndex, KeyboardError, LightDirection, LightSettings, LightType, Macro,
    MacroAction, MacroKind, MouseButton,
};
use kb390l_transport::{cmd, Report};

use common::{connected_keyboard, keyboard};

#[test]
fn reports_are_sealed_with_checksum() {
    let (mut kb, state) = connected_keyboard();
    kb.set_game_mode(true).unwrap();

    let sent = state.borrow().last_sent();
    assert_eq!(sent[..8], [0, cmd::GAME_MODE, 1, 0, 0, 0, 0, 0]);
    let sum = sent.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    assert_eq!(sum, 0);
}

#[test]
fn page_reads_are_cached() {
    let (mut kb, state) = connected_keyboard();
    let mut page = vec![0u8; 192];
    page[..4].copy_from_slice(&[0, 1, 5, 0x04]);
    state.borrow_mut().set_page(cmd::MACRO, 3, page.clone());

    let first = kb.read_page(cmd::MACRO, 3).unwrap();
    let second = kb.read_page(cmd::MACRO, 3).unwrap();

    assert_eq!(first, page);
    assert_eq!(second, page);
    assert_eq!(state.borrow().page_reads, 1);
    assert_eq!(
        state.borrow().sent,
        vec![Report::page_query(cmd::MACRO, 3).to_bytes()]
    );
    assert_eq!(state.borrow().sent[0][..4], [0, cmd::MACRO | cmd::FLAG_GET, 0, 3]);
}

#[test]
fn page_header_is_validated() {
    let (mut kb, state) = connected_keyboard();
    state.borrow_mut().mute = true;

    assert!(kb.read_page(cmd::BUTTONS, 0).is_err());
}

#[test]
fn button_edits_are_staged_until_save() {
    let (mut kb, state) = connected_keyboard();
    let action = ButtonAction::Mouse(MouseButton::Right);

    kb.set_button(KeyIndex::A, action).unwrap();
    assert!(kb.unsaved_changes());
    assert!(kb.is_dirty(cmd::BUTTONS, 0));
    assert_eq!(kb.button(KeyIndex::A).unwrap(), action);
    assert!(state.borrow().page_writes.is_empty());

    kb.save().unwrap();
    assert!(!kb.unsaved_changes());

    let state = state.borrow();
    let (page, index, bytes) = &state.page_writes[0];
    assert_eq!((*page, *index), (cmd::BUTTONS, 0));
    assert_eq!(bytes.len(), 512);
    let offset = KeyIndex::A.index() * 4;
    assert_eq!(bytes[offset..offset + 4], action.encode().to_le_bytes());

    // Header announced 8 blocks of 64
    let header = state
        .sent
        .iter()
        .find(|r| r[1] == cmd::BUTTONS)
        .expect("no write header");
    assert_eq!(header[3..5], [0, 8]);
}

#[test]
fn unchanged_button_is_not_staged() {
    let (mut kb, _state) = connected_keyboard();
    kb.set_button(KeyIndex::Space, ButtonAction::OFF).unwrap();
    assert!(!kb.unsaved_changes());
}

#[test]
fn enabled_buttons_header_uses_fixed_unit_count() {
    let (mut kb, state) = connected_keyboard();
    kb.set_button_enabled(KeyIndex::Escape, true).unwrap();
    assert!(kb.button_enabled(KeyIndex::Escape).unwrap());
    kb.save().unwrap();

    let state = state.borrow();
    let header = state
        .sent
        .iter()
        .find(|r| r[1] == cmd::ENABLED_BUTTONS)
        .expect("no write header");
    assert_eq!(header[4], 18);
    assert_eq!(state.page_writes[0].2.len(), 64);
}

#[test]
fn save_stops_at_first_failure() {
    let (mut kb, state) = connected_keyboard();
    kb.set_button(KeyIndex::A, ButtonAction::FunctionKey).unwrap();
    kb.set_button_enabled(KeyIndex::A, true).unwrap();
    kb.set_macro(1, &Macro::new(1, vec![MacroAction::new(MacroKind::Press, 0x04, 2)]))
        .unwrap();

    state.borrow_mut().fail_write = Some(1);
    assert!(matches!(
        kb.save(),
        Err(KeyboardError::ShortTransfer { .. })
    ));

    assert!(!kb.is_dirty(cmd::BUTTONS, 0));
    assert!(kb.is_dirty(cmd::ENABLED_BUTTONS, 0));
    assert!(kb.is_dirty(cmd::MACRO, 1));
    assert_eq!(state.borrow().page_writes.len(), 1);

    kb.save().unwrap();
    assert!(!kb.unsaved_changes());
    let order: Vec<_> = state
        .borrow()
        .page_writes
        .iter()
        .map(|(page, index, _)| (*page, *index))
        .collect();
    assert_eq!(
        order,
        [(cmd::BUTTONS, 0), (cmd::ENABLED_BUTTONS, 0), (cmd::MACRO, 1)]
    );
}

#[test]
fn discard_drops_staged_edits() {
    let (mut kb, state) = connected_keyboard();
    kb.set_button(KeyIndex::Q, ButtonAction::Advanced(3)).unwrap();
    kb.discard_changes();

    assert!(!kb.unsaved_changes());
    assert_eq!(kb.button(KeyIndex::Q).unwrap(), ButtonAction::OFF);
    assert_eq!(state.borrow().page_reads, 2);
}

#[test]
fn macro_survives_device_roundtrip() {
    let (mut kb, state) = connected_keyboard();
    let m = Macro::new(
        3,
        vec![
            MacroAction::new(MacroKind::Down, 0xE1, 5),
            MacroAction::new(MacroKind::Press, 0x04, 200),
            MacroAction::new(MacroKind::Up, 0xE1, 0),
            MacroAction::new(MacroKind::Press, MouseButton::Left.code(), 1),
        ],
    );

    kb.set_macro(7, &m).unwrap();
    assert_eq!(kb.macro_at(7).unwrap(), m);
    kb.save().unwrap();
    kb.discard_changes();

    assert_eq!(kb.macro_at(7).unwrap(), m);
    assert_eq!(state.borrow().page(cmd::MACRO, 7).len(), 192);
}

#[test]
fn macro_index_is_checked() {
    let (mut kb, state) = connected_keyboard();
    assert!(matches!(
        kb.macro_at(32),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(state.borrow().sent.is_empty());
}

#[test]
fn invalid_speed_settings_do_no_io() {
    let (mut kb, state) = connected_keyboard();
    assert!(matches!(
        kb.set_report_rate(4),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(matches!(
        kb.set_response_time(0),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(matches!(
        kb.set_response_time(11),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(state.borrow().sent.is_empty());
}

#[test]
fn speed_settings_are_written_through() {
    let (mut kb, state) = connected_keyboard();
    kb.set_report_rate(3).unwrap();
    assert_eq!(state.borrow().last_sent()[..3], [0, cmd::REPORT_RATE, 3]);
    assert_eq!(kb.report_rate().unwrap().hz(), 1000);

    // Read first so the cached response has to follow the write
    state
        .borrow_mut()
        .flags
        .insert(cmd::RESPONSE_TIME, [2, 0, 0, 0, 0, 0]);
    assert_eq!(kb.response_time().unwrap().millis(), 4);
    kb.set_response_time(4).unwrap();
    assert_eq!(kb.response_time().unwrap().millis(), 8);
    assert!(!kb.unsaved_changes());
}

#[test]
fn light_flags_keep_other_bytes() {
    let (mut kb, state) = connected_keyboard();
    state
        .borrow_mut()
        .flags
        .insert(cmd::CONTROL, [0xAA, 1, 5, 30, 0xBB, 2]);

    kb.set_light_type(LightType::MASK1).unwrap();
    assert_eq!(
        state.borrow().last_sent()[..8],
        [0, cmd::CONTROL, 0xAA, 51, 5, 30, 0xBB, 2]
    );
    assert_eq!(kb.light_type().unwrap(), LightType::MASK1);
    assert_eq!(kb.light_direction().unwrap(), LightDirection::Left);
}

#[test]
fn unchanged_light_flag_sends_nothing() {
    let (mut kb, state) = connected_keyboard();
    state.borrow_mut().flags.insert(cmd::CONTROL, [0, 2, 3, 40, 0, 1]);

    kb.set_light_brightness(40).unwrap();
    let sent = state.borrow().sent.len();
    assert_eq!(sent, 1);
}

#[test]
fn light_ranges_are_checked_before_io() {
    let (mut kb, state) = connected_keyboard();
    assert!(kb.set_light_brightness(51).is_err());
    assert!(kb.set_light_delay(11).is_err());
    assert!(kb
        .set_light_settings(&LightSettings {
            kind: LightType::WAVE,
            delay: 3,
            brightness: 60,
            direction: LightDirection::Up,
        })
        .is_err());
    assert!(state.borrow().sent.is_empty());
}

#[test]
fn light_settings_apply_together() {
    let (mut kb, _state) = connected_keyboard();
    let settings = LightSettings {
        kind: LightType::RIPPLE,
        delay: 4,
        brightness: 25,
        direction: LightDirection::Down,
    };
    kb.set_light_settings(&settings).unwrap();
    kb.discard_changes();
    assert_eq!(kb.light_settings().unwrap(), settings);
}

#[test]
fn bad_light_direction_from_device_is_a_response_error() {
    let (mut kb, state) = connected_keyboard();
    state.borrow_mut().flags.insert(cmd::CONTROL, [0, 2, 3, 40, 0, 9]);

    assert!(matches!(
        kb.light_direction(),
        Err(KeyboardError::UnexpectedResponse(_))
    ));
    assert!(matches!(
        kb.light_settings(),
        Err(KeyboardError::UnexpectedResponse(_))
    ));
}

#[test]
fn staged_byte_edits() {
    let (mut kb, state) = connected_keyboard();
    kb.write_byte(cmd::ENABLED_BUTTONS, 2, 0x10).unwrap();
    assert_eq!(kb.read_byte(cmd::ENABLED_BUTTONS, 2).unwrap(), 0x10);
    assert!(kb.is_dirty(cmd::ENABLED_BUTTONS, 0));
    assert!(kb.read_byte(cmd::ENABLED_BUTTONS, 64).is_err());

    kb.save().unwrap();
    assert_eq!(state.borrow().page(cmd::ENABLED_BUTTONS, 0)[2], 0x10);
}

#[test]
fn byte_access_refuses_flag_commands() {
    let (mut kb, state) = connected_keyboard();
    kb.light_type().unwrap();
    let sent = state.borrow().sent.len();

    assert!(matches!(
        kb.write_byte(cmd::CONTROL, 3, 9),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(matches!(
        kb.read_byte(cmd::REPORT_RATE, 2),
        Err(KeyboardError::InvalidParameter(_))
    ));
    assert!(!kb.is_dirty(cmd::CONTROL, 0));
    assert!(!kb.unsaved_changes());

    kb.save().unwrap();
    assert_eq!(state.borrow().sent.len(), sent);
    assert!(state.borrow().page_writes.is_empty());
}

#[test]
fn reset_sends_reset_all() {
    let (mut kb, state) = connected_keyboard();
    kb.reset_to_factory_defaults().unwrap();
    assert_eq!(state.borrow().last_sent()[..3], [0, cmd::RESET, 0xFF]);
}

#[test]
fn closed_session_refuses_io() {
    let (mut kb, state) = keyboard();
    assert!(!kb.ping());
    assert!(matches!(kb.report_rate(), Err(KeyboardError::NotConnected)));
    assert!(matches!(
        kb.read_page(cmd::BUTTONS, 0),
        Err(KeyboardError::NotConnected)
    ));
    assert!(state.borrow().sent.is_empty());
}
