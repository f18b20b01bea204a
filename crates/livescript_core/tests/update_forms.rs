use livescript_core::{
    update, AppState, Effect, FormDraft, Msg, ProductEntry, ProductInfo, ScriptType, ANCHOR_NAME,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    livescript_logging::initialize_for_tests();
}

#[test]
fn unchanged_draft_does_not_mark_dirty() {
    init_logging();
    let state = AppState::new();
    let (mut state, _) = update(
        state,
        Msg::FieldEdited {
            script_type: ScriptType::SingleProduct,
            name: ANCHOR_NAME.into(),
            value: "小王".into(),
        },
    );
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::FieldEdited {
            script_type: ScriptType::SingleProduct,
            name: ANCHOR_NAME.into(),
            value: "小王".into(),
        },
    );
    assert!(!state.consume_dirty());

    let draft = state.draft(ScriptType::SingleProduct);
    let (mut state, _) = update(
        state,
        Msg::DraftChanged {
            script_type: ScriptType::SingleProduct,
            draft,
        },
    );
    assert!(!state.consume_dirty());
}

#[test]
fn drafts_are_kept_per_tab() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FieldEdited {
            script_type: ScriptType::GuestInteraction,
            name: ANCHOR_NAME.into(),
            value: "小李".into(),
        },
    );
    let (state, _) = update(state, Msg::TabSelected(ScriptType::SellingPoint));

    assert_eq!(state.draft(ScriptType::GuestInteraction).field(ANCHOR_NAME), "小李");
    assert_eq!(state.draft(ScriptType::SingleProduct).field(ANCHOR_NAME), "");
}

#[test]
fn product_rows_can_be_added_but_never_drop_below_one() {
    init_logging();
    let tab = ScriptType::SingleProduct;
    let (state, _) = update(AppState::new(), Msg::ProductAdded(tab));
    assert_eq!(state.draft(tab).products.len(), 2);

    let (state, _) = update(state, Msg::ProductRemoved { script_type: tab, index: 0 });
    let (state, _) = update(state, Msg::ProductRemoved { script_type: tab, index: 0 });
    assert_eq!(state.draft(tab).products.len(), 1);
}

#[test]
fn lookup_requires_product_id_and_merges_result() {
    init_logging();
    let tab = ScriptType::SellingPoint;
    let (state, effects) = update(AppState::new(), Msg::LookupClicked { script_type: tab, index: 0 });
    assert!(effects.is_empty());
    assert!(state.view().notice.is_some());

    let (state, _) = update(
        state,
        Msg::ProductEdited {
            script_type: tab,
            index: 0,
            product: ProductEntry {
                product_id: " 6573 ".into(),
                ..ProductEntry::default()
            },
        },
    );
    let (state, effects) = update(state, Msg::LookupClicked { script_type: tab, index: 0 });
    assert_eq!(
        effects,
        vec![Effect::LookupProduct {
            script_type: tab,
            index: 0,
            item_id: "6573".into(),
        }]
    );
    assert!(state.view().tab(tab).lookup_pending);

    // A second click while pending does not issue another lookup.
    let (state, effects) = update(state, Msg::LookupClicked { script_type: tab, index: 0 });
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::LookupDone {
            script_type: tab,
            index: 0,
            result: Ok(ProductInfo {
                product_name: Some("山东苹果".into()),
                product_price: Some("29.9".into()),
                brand_info: None,
                sellpoint: Some("脆甜".into()),
            }),
        },
    );
    let product = &state.draft(tab).products[0];
    assert_eq!(product.product_id, " 6573 ");
    assert_eq!(product.product_name, "山东苹果");
    assert_eq!(product.product_price, "29.9");
    assert_eq!(product.sellpoint, "脆甜");
    assert!(!state.view().tab(tab).lookup_pending);
    assert_eq!(state.view().notice, None);
}

#[test]
fn failed_lookup_sets_notice_without_touching_draft() {
    init_logging();
    let tab = ScriptType::SingleProduct;
    let (state, _) = update(
        AppState::new(),
        Msg::ProductEdited {
            script_type: tab,
            index: 0,
            product: ProductEntry {
                product_id: "1".into(),
                ..ProductEntry::default()
            },
        },
    );
    let before = state.draft(tab);
    let (state, _) = update(state, Msg::LookupClicked { script_type: tab, index: 0 });
    let (state, _) = update(
        state,
        Msg::LookupDone {
            script_type: tab,
            index: 0,
            result: Err("item not found".into()),
        },
    );
    assert_eq!(state.draft(tab), before);
    assert_eq!(
        state.view().notice.as_deref(),
        Some("product lookup failed: item not found")
    );
}

fn named(id: &str, name: &str) -> ProductEntry {
    ProductEntry {
        product_id: id.into(),
        product_name: name.into(),
        product_price: "1".into(),
        ..ProductEntry::default()
    }
}

#[test]
fn rows_stay_put_while_a_lookup_is_pending() {
    init_logging();
    let tab = ScriptType::GuestInteraction;
    let draft = FormDraft {
        products: vec![named("1", "A"), named("2", "B"), named("3", "C")],
        ..FormDraft::default()
    };
    let (state, _) = update(AppState::new(), Msg::DraftChanged { script_type: tab, draft });
    let (state, effects) = update(state, Msg::LookupClicked { script_type: tab, index: 1 });
    assert_eq!(effects.len(), 1);

    let (state, _) = update(state, Msg::ProductRemoved { script_type: tab, index: 0 });
    assert_eq!(state.draft(tab).products.len(), 3);
    assert!(state.view().notice.is_some());

    let (state, _) = update(
        state,
        Msg::DraftChanged {
            script_type: tab,
            draft: FormDraft::default(),
        },
    );
    assert_eq!(state.draft(tab).products.len(), 3);

    let (state, _) = update(
        state,
        Msg::LookupDone {
            script_type: tab,
            index: 1,
            result: Ok(ProductInfo {
                product_name: Some("B from lookup".into()),
                ..ProductInfo::default()
            }),
        },
    );
    let names: Vec<String> = state
        .draft(tab)
        .products
        .iter()
        .map(|p| p.product_name.clone())
        .collect();
    assert_eq!(names, vec!["A", "B from lookup", "C"]);

    // Once the lookup is done, rows can be removed again.
    let (state, _) = update(state, Msg::ProductRemoved { script_type: tab, index: 0 });
    assert_eq!(state.draft(tab).products.len(), 2);
    assert_eq!(state.draft(tab).products[0].product_name, "B from lookup");
}

#[test]
fn other_tabs_can_remove_rows_during_a_lookup() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::ProductEdited {
            script_type: ScriptType::SingleProduct,
            index: 0,
            product: named("9", "X"),
        },
    );
    let (state, _) = update(
        state,
        Msg::LookupClicked {
            script_type: ScriptType::SingleProduct,
            index: 0,
        },
    );
    let (state, _) = update(state, Msg::ProductAdded(ScriptType::SellingPoint));
    let (state, _) = update(
        state,
        Msg::ProductRemoved {
            script_type: ScriptType::SellingPoint,
            index: 1,
        },
    );
    assert_eq!(state.draft(ScriptType::SellingPoint).products.len(), 1);
}
