use super::{DemoLaunchMode, ProjectConfig, SelectorTable};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in site registry. YAML project files with the same name override
/// these entries.
pub fn builtin_projects() -> Vec<ProjectConfig> {
    vec![slotarena(), spinoria(), spinoria_mobile()]
}

/// Desktop site, demo opens as an in-page modal.
fn slotarena() -> ProjectConfig {
    ProjectConfig {
        name: "slotarena".to_string(),
        base_url: "https://www.slotarena.com".to_string(),
        list_path: "/slots/".to_string(),
        selectors: SelectorTable {
            cookie_banner: strings(&[
                "#onetrust-accept-btn-handler",
                "button.cookie-consent__accept",
                ".cc-window .cc-btn.cc-allow",
            ]),
            newsletter_modal: strings(&[
                ".newsletter-modal button.modal__close",
                "#nl-signup-popup .icon-close",
            ]),
            offer_banner: strings(&[".sticky-offer__dismiss", ".promo-bar__close"]),
            provider_dropdown: ".games-filter--provider .dropdown__toggle".to_string(),
            provider_option: ".games-filter--provider .dropdown__menu li".to_string(),
            provider_reset: ".games-filter--provider .dropdown__menu li.is-default"
                .to_string(),
            type_dropdown: ".games-filter--type .dropdown__toggle".to_string(),
            type_option: ".games-filter--type .dropdown__menu li".to_string(),
            search_input: "input.games-search__field".to_string(),
            result_tile: ".games-grid .game-card".to_string(),
            result_producer: ".game-card__provider".to_string(),
            game_title: "h1.game-detail__title".to_string(),
            demo_cta: "a.game-detail__demo-btn".to_string(),
            demo_overlay: ".game-detail__media-overlay".to_string(),
            demo_close: ".game-modal button.game-modal__close".to_string(),
            legal_links: "footer .legal-nav a".to_string(),
        },
        provider_label: "1×2 Gaming".to_string(),
        slot_type_label: Some("Jackpot Slots".to_string()),
        search_phrase: "Book of".to_string(),
        demo_launch: DemoLaunchMode::Popup,
        back_steps: 2,
        legal_hosts: strings(&["legal.slotarena.com", "pages.slotarena.io"]),
        scan_frames: false,
    }
}

/// Desktop site, demo opens a new tab.
fn spinoria() -> ProjectConfig {
    ProjectConfig {
        name: "spinoria".to_string(),
        base_url: "https://spinoria.io".to_string(),
        list_path: "/casino/slots/".to_string(),
        selectors: SelectorTable {
            cookie_banner: strings(&[
                "button[data-role='acceptAll']",
                "#cookiebar .accept",
            ]),
            newsletter_modal: strings(&[".subscribe-overlay .close-btn"]),
            offer_banner: strings(&[".top-banner .dismiss", ".bonus-strip__close"]),
            provider_dropdown: "#filter-provider .select-toggle".to_string(),
            provider_option: "#filter-provider .select-options .option".to_string(),
            provider_reset: "#filter-provider .select-options .option[data-value='all']"
                .to_string(),
            type_dropdown: "#filter-category .select-toggle".to_string(),
            type_option: "#filter-category .select-options .option".to_string(),
            search_input: "#games-search input[type='search']".to_string(),
            result_tile: ".slot-list article.slot-tile".to_string(),
            result_producer: ".slot-tile .slot-tile__vendor".to_string(),
            game_title: ".game-page h1".to_string(),
            demo_cta: ".game-page .cta-demo".to_string(),
            demo_overlay: ".game-page .thumb-hover".to_string(),
            demo_close: String::new(),
            legal_links: "footer nav.footer-legal a".to_string(),
        },
        provider_label: "Play'n GO".to_string(),
        slot_type_label: Some("Megaways".to_string()),
        search_phrase: "Wolf".to_string(),
        demo_launch: DemoLaunchMode::NewTab,
        back_steps: 3,
        legal_hosts: strings(&["legal.spinoria.io", "static.spinoria.net"]),
        scan_frames: false,
    }
}

/// Mobile variant of spinoria; consent UI renders inside embedded frames.
fn spinoria_mobile() -> ProjectConfig {
    let desktop = spinoria();
    ProjectConfig {
        name: "spinoria-mobile".to_string(),
        base_url: "https://m.spinoria.io".to_string(),
        list_path: "/slots/".to_string(),
        selectors: SelectorTable {
            cookie_banner: strings(&[
                "#mobile-consent button.agree",
                "button[data-role='acceptAll']",
            ]),
            newsletter_modal: strings(&[".m-subscribe__close"]),
            offer_banner: strings(&[".m-bonus-bar .close"]),
            search_input: ".m-search input".to_string(),
            result_tile: ".m-slot-list .m-slot-card".to_string(),
            result_producer: ".m-slot-card__vendor".to_string(),
            game_title: ".m-game h1".to_string(),
            demo_cta: ".m-game .m-cta-demo".to_string(),
            demo_overlay: String::new(),
            demo_close: ".m-demo-frame__close".to_string(),
            legal_links: ".m-footer a.legal".to_string(),
            ..desktop.selectors
        },
        provider_label: "Play'n GO".to_string(),
        slot_type_label: None,
        search_phrase: "Wolf".to_string(),
        demo_launch: DemoLaunchMode::Popup,
        back_steps: 3,
        legal_hosts: desktop.legal_hosts,
        scan_frames: true,
    }
}
