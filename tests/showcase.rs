//! End-to-end scenarios driven through the public `Showcase` surface.

use std::rc::Rc;
use std::time::{Duration, Instant};

use cartshelf::app::Showcase;
use cartshelf::context::AppContext;
use cartshelf::events::Topic;
use cartshelf::localization::{LocaleTable, Localization};
use cartshelf::modal::ModalPhase;
use cartshelf::project::{self, Filter, ProjectRecord, parse_source};
use cartshelf::scene::HitTarget;
use cartshelf::storage::Preferences;
use cartshelf::ui::theme::ThemeMode;
use cartshelf::ui::{KeyCombo, Size};
use winit::keyboard::KeyCode;

fn records(count: usize) -> Vec<ProjectRecord> {
    let mut records: Vec<ProjectRecord> = (0..count)
        .map(|i| {
            let kind = if i % 2 == 0 { "game" } else { "coding" };
            let raw = format!(
                "---\ntitle: Project {i}\ntype: {kind}\ndate: 2024-{:02}-01\n---\nAbout project {i}.\n",
                i % 12 + 1
            );
            parse_source(&format!("p{i:02}"), &raw).0
        })
        .collect();
    project::sort_by_date(&mut records);
    records
}

fn showcase(count: usize, viewport: Size, now: Instant) -> Showcase {
    let table = LocaleTable::from_kdl_str(include_str!("../data/locale.kdl")).expect("table");
    let prefs = Preferences::in_memory();
    let locale = Localization::restore(Rc::new(table), &prefs, "it");
    let ctx = AppContext::new(locale, prefs, ThemeMode::Dark);
    Showcase::from_parts(ctx, records(count), 20, Some(11), viewport, now)
}

#[test]
fn locale_switch_publishes_once_and_refreshes_labels() {
    let t0 = Instant::now();
    let mut app = showcase(3, Size::new(1024.0, 768.0), t0);
    assert_eq!(app.context().locale.locale(), "it");
    let footer_it = app.scene().footer().text();

    assert!(!app.switch_locale("it").expect("known locale"));
    assert_eq!(app.context().bus.history().count_topic(Topic::LocaleChanged), 0);

    assert!(app.switch_locale("en").expect("known locale"));
    assert_eq!(app.context().bus.history().count_topic(Topic::LocaleChanged), 1);
    assert_eq!(
        app.scene().footer().text(),
        "Crafted with passion, one cartridge at a time"
    );
    assert_ne!(app.scene().footer().text(), footer_it);
    assert_eq!(app.context().prefs.get("cartshelf.locale"), Some("en"));

    assert!(app.switch_locale("fr").is_err());
    assert_eq!(app.context().locale.locale(), "en");
}

#[test]
fn loaded_directory_sorts_newest_first_and_filters() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sources = [
        ("jan.md", "coding", "2024-01-15"),
        ("mar.md", "game", "2024-03-15"),
        ("feb.md", "game", "2024-02-15"),
    ];
    for (name, kind, date) in sources {
        std::fs::write(
            dir.path().join(name),
            format!("---\ntitle: {name}\ntype: {kind}\ndate: {date}\n---\nbody\n"),
        )
        .expect("write source");
    }

    let records = project::load_all(dir.path()).expect("readable dir");
    let slugs: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, ["mar", "feb", "jan"]);

    let games: Vec<&str> = project::filter(&records, Filter::Games)
        .into_iter()
        .map(|r| r.slug.as_str())
        .collect();
    assert_eq!(games, ["mar", "feb"]);
}

#[test]
fn equal_dates_keep_discovery_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["b.md", "a.md", "c.md"] {
        std::fs::write(
            dir.path().join(name),
            "---\ntitle: same\ntype: game\ndate: 2024-06-01\n---\n",
        )
        .expect("write source");
    }
    let records = project::load_all(dir.path()).expect("readable dir");
    let slugs: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, ["a", "b", "c"]);
}

#[test]
fn resize_keeps_entities_and_hover() {
    let t0 = Instant::now();
    let mut app = showcase(3, Size::new(1024.0, 768.0), t0);
    assert_eq!(app.scene().layout().columns, 4);
    let ids = app.scene().ids().to_vec();
    let first = ids[0];

    let slot = app.scene().layout().slot(0).expect("slot");
    let c = slot.center();
    app.pointer_moved(c.x, c.y);
    assert_eq!(app.scene().hovered(), Some(HitTarget::Cartridge(first)));

    app.resize(Size::new(600.0, 800.0));
    assert_eq!(app.scene().layout().columns, 2);
    assert_eq!(app.scene().ids(), ids.as_slice());
    for &id in &ids {
        assert!(app.scene().cartridge(id).is_some());
    }

    // Follow the cartridge to its new slot; it is the same entity.
    let slot = app.scene().layout().slot(0).expect("slot");
    assert_eq!(app.scene().cartridge(first).expect("live").slot(), slot);
    let c = slot.center();
    app.pointer_moved(c.x, c.y);
    assert_eq!(app.scene().hovered(), Some(HitTarget::Cartridge(first)));
    assert!(app.scene().cartridge(first).expect("live").is_hovered());
}

#[test]
fn escape_closes_modal_and_restores_scroll() {
    let t0 = Instant::now();
    let mut app = showcase(12, Size::new(1024.0, 768.0), t0);
    app.scroll(120.0);
    assert_eq!(app.scene().page().offset(), 120.0);

    let record = Rc::clone(&app.records()[0]);
    app.open_project(record, t0);
    assert!(app.modal().is_open());
    assert!(app.scene().page().is_locked());

    app.scroll(50.0);
    assert!(app.key_pressed(KeyCombo::plain(KeyCode::Escape), t0));
    assert!(app.modal().is_closing());

    app.frame(t0 + Duration::from_millis(300));
    assert_eq!(app.modal().phase(), ModalPhase::Closed);
    assert!(!app.scene().page().is_locked());
    assert_eq!(app.scene().page().offset(), 120.0);
}

#[test]
fn filter_hides_cartridges_in_order() {
    let t0 = Instant::now();
    let mut app = showcase(6, Size::new(1024.0, 768.0), t0);
    assert!(app.apply_filter(Filter::Coding, t0));
    let visible = app.scene().visible_slugs();
    let expected: Vec<&str> = project::filter(app.records(), Filter::Coding)
        .into_iter()
        .map(|r| r.slug.as_str())
        .collect();
    assert_eq!(visible, expected);
    assert_eq!(app.context().bus.history().count_topic(Topic::FilterChanged), 1);

    assert!(app.apply_filter(Filter::All, t0));
    assert_eq!(app.scene().visible_slugs().len(), 6);
}
