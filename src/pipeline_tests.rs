#[cfg(test)]
mod tests {
    use crate::config::GeneratorConfig;
    use crate::pipeline::{Generator, StageStatus};
    use crate::test_support::TempWorkspace;

    const LOGIN_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompositeView>
  <Button id="loginBtn" tag="primary"/>
  <CompositeView id="form">
    <ImageView id="avatar" tag="round"/>
  </CompositeView>
</CompositeView>
"#;

    const LOGIN: &str = "res/default/layout/login.xml";
    const LOGIN_PARAMS: &str = "res/default/layout/login.json";
    const THEME: &str = "res/theme/default.xml";
    const LIGHT_THEME: &str = "res/theme/default.light.xml";
    const BINDING: &str = "ts/presenter/viewHelper/LoginViewBinding.ts";
    const EVENT: &str = "ts/presenter/viewHelper/LoginViewEvent.ts";
    const FACTORY: &str = "ts/presenter/viewHelper/createLoginViewBindingAndEvent.ts";

    fn workspace(label: &str) -> TempWorkspace {
        let ws = TempWorkspace::new(label);
        ws.write("node_modules/yunos/package.json", "{}");
        ws.write("node_modules/yunos/ui/view/CompositeView.d.ts", "");
        ws.write("node_modules/yunos/ui/view/Button.d.ts", "");
        ws.write("node_modules/yunos/ui/view/ImageView.d.ts", "");
        ws.write("node_modules/yunos/ui/event/TouchEvent.d.ts", "");
        ws.write(LOGIN, LOGIN_LAYOUT);
        ws
    }

    fn generator(ws: &TempWorkspace) -> Generator {
        Generator::new(ws.root(), GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_first_run_writes_every_artifact() {
        let ws = workspace("pipeline-first");
        let report = generator(&ws).process_layout(&ws.path(LOGIN));

        assert!(!report.not_applicable);
        assert!(!report.has_failures(), "{:?}", report);
        assert_eq!(report.normalize, StageStatus::Written);
        assert_eq!(report.params, StageStatus::Written);
        assert_eq!(report.themes.len(), 2);
        assert!(report.themes.iter().all(|t| t.status == StageStatus::Written));
        assert_eq!(report.sources.len(), 3);

        let layout = ws.read(LOGIN);
        assert!(layout.contains(r#"id="login""#));
        assert!(layout.contains(r#"propertySetName="login""#));
        assert!(layout.contains(r#"layout="{layout.login}""#));
        assert!(layout.contains(r#"layout="{layout.form}""#));
        assert!(!layout.contains(r#"layout="{layout.avatar}""#));

        let params: serde_json::Value = serde_json::from_str(&ws.read(LOGIN_PARAMS)).unwrap();
        assert_eq!(
            params,
            serde_json::json!({
                "login": { "type": "RelativeLayout", "params": { "loginBtn": {}, "form": {} } },
                "form": { "type": "RelativeLayout", "params": { "avatar": {} } }
            })
        );

        for theme in [THEME, LIGHT_THEME] {
            let text = ws.read(theme);
            assert!(text.contains(r#"<theme name="default" extend="hdt">"#));
            assert!(text.contains(r#"<property-set name="login">"#));
            assert!(text.contains(r#"<id name="avatar">"#));
            assert!(text.contains(r#"<tag name="round">"#));
        }

        let binding = ws.read(BINDING);
        assert!(binding.contains("public loginBtn: Button;"));
        assert!(binding.contains("this.avatar = rootView.findViewById('avatar') as ImageView;"));
        assert!(binding.contains("import Button = require(\"yunos/ui/view/Button\");"));

        let event = ws.read(EVENT);
        assert!(event.contains("handleAvatarTouchEnd?(event: TouchEvent): void;"));
        assert!(!event.contains("handleLoginBtn"));
        assert!(ws.exists(FACTORY));
        assert!(!ws.exists("ts/presenter/base_with_view_and_event"));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let ws = workspace("pipeline-second");
        let generator = generator(&ws);
        generator.process_layout(&ws.path(LOGIN));
        let layout = ws.read(LOGIN);
        let theme = ws.read(THEME);

        let report = generator.process_layout(&ws.path(LOGIN));
        assert!(report.is_unchanged(), "{:?}", report);
        assert_eq!(report.normalize, StageStatus::Unchanged);
        assert_eq!(report.params, StageStatus::Unchanged);
        assert_eq!(ws.read(LOGIN), layout);
        assert_eq!(ws.read(THEME), theme);
    }

    #[test]
    fn test_hand_edits_survive_regeneration() {
        let ws = workspace("pipeline-edits");
        let generator = generator(&ws);
        generator.process_layout(&ws.path(LOGIN));

        ws.write(
            LOGIN_PARAMS,
            r#"{"login": {"type": "Grid", "params": {"loginBtn": {"row": 1}}}}"#,
        );
        ws.write(
            LOGIN,
            &ws.read(LOGIN)
                .replace(r#"<Button id="loginBtn" tag="primary"/>"#, r#"<Button id="loginBtn" tag="primary"/><Button id="signup"/>"#),
        );

        let report = generator.process_layout(&ws.path(LOGIN));
        assert!(!report.has_failures(), "{:?}", report);

        let params: serde_json::Value = serde_json::from_str(&ws.read(LOGIN_PARAMS)).unwrap();
        assert_eq!(params["login"]["type"], "Grid");
        assert_eq!(params["login"]["params"]["loginBtn"], serde_json::json!({ "row": 1 }));
        assert_eq!(params["login"]["params"]["signup"], serde_json::json!({}));
        assert!(ws.read(THEME).contains(r#"<id name="signup">"#));
        assert!(ws.read(BINDING).contains("public signup: Button;"));
    }

    #[test]
    fn test_malformed_layout_aborts_file() {
        let ws = workspace("pipeline-bad-xml");
        ws.write(LOGIN, "<CompositeView><Button></CompositeView>");

        let report = generator(&ws).process_layout(&ws.path(LOGIN));
        assert!(report.normalize.is_failed());
        assert_eq!(report.params, StageStatus::Skipped);
        assert!(report.themes.is_empty() && report.sources.is_empty());
        assert!(!ws.exists(LOGIN_PARAMS));
        assert_eq!(ws.read(LOGIN), "<CompositeView><Button></CompositeView>");
    }

    #[test]
    fn test_malformed_params_fail_only_their_stage() {
        let ws = workspace("pipeline-bad-json");
        ws.write(LOGIN_PARAMS, "{ broken");

        let report = generator(&ws).process_layout(&ws.path(LOGIN));
        assert!(report.params.is_failed());
        assert_eq!(ws.read(LOGIN_PARAMS), "{ broken");
        assert!(report.themes.iter().all(|t| t.status == StageStatus::Written));
        assert!(report.sources.iter().all(|s| s.status == StageStatus::Written));
    }

    #[test]
    fn test_invalid_theme_fails_only_that_file() {
        let ws = workspace("pipeline-bad-theme");
        ws.write(THEME, "<styles/>");

        let report = generator(&ws).process_layout(&ws.path(LOGIN));
        assert!(report.themes[0].status.is_failed());
        assert_eq!(report.themes[1].status, StageStatus::Written);
        assert_eq!(ws.read(THEME), "<styles/>");
    }

    #[test]
    fn test_other_paths_are_not_applicable() {
        let ws = workspace("pipeline-na");
        ws.write("res/default/layout/notes.txt", "hello");

        let generator = generator(&ws);
        assert!(generator.process_layout(&ws.path("res/default/layout/notes.txt")).not_applicable);
        assert!(generator.process_layout(&ws.path(THEME)).not_applicable);
        assert!(!ws.exists(THEME));
    }

    #[test]
    fn test_presenter_base_when_enabled() {
        let ws = workspace("pipeline-presenter");
        let config = GeneratorConfig {
            presenter_base: true,
            ..GeneratorConfig::default()
        };
        let report = Generator::new(ws.root(), config)
            .unwrap()
            .process_layout(&ws.path(LOGIN));

        assert_eq!(report.sources.len(), 4);
        let presenter =
            ws.read("ts/presenter/base_with_view_and_event/LoginBasePresenterWithViewAndEvent.ts");
        assert!(presenter.contains("protected abstract onAvatarTouchEnd(event: TouchEvent): void;"));
    }

    #[test]
    fn test_workspace_run_shares_theme_files() {
        let ws = workspace("pipeline-all");
        ws.write(
            "res/default/layout/home.xml",
            r#"<CompositeView><TextView id="title"/></CompositeView>"#,
        );

        let reports = generator(&ws).process_workspace();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.has_failures()));

        let theme = ws.read(THEME);
        assert!(theme.contains(r#"<property-set name="home">"#));
        assert!(theme.contains(r#"<property-set name="login">"#));
        assert!(ws.exists("ts/presenter/viewHelper/HomeViewBinding.ts"));
    }
}
