//! Integration tests for editor crate

use ecnn_editor::{
    insert_asset, AssetError, AssetKind, AssetUploader, Command, CommandError, EditorConfig,
    EditorError, EditorSession, EmbedKind, FormatMark, LocalFile, TextAlign, UploadError,
    UploadedAsset,
};
use ecnn_model::{Position, Selection, Step, Transaction};
use ecnn_html::{deserialize, serialize};
use ecnn_schema::{article_schema, AttrValue, RenderContext};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn session(markup: &str) -> EditorSession {
    EditorSession::from_html(Arc::new(article_schema().unwrap()), markup, EditorConfig::default())
}

fn caret(path: &[usize], offset: usize) -> Command {
    Command::SetSelection(Selection::caret(Position::new(path.to_vec(), offset)))
}

fn select(from: (&[usize], usize), to: (&[usize], usize)) -> Command {
    Command::SetSelection(Selection::new(
        Position::new(from.0.to_vec(), from.1),
        Position::new(to.0.to_vec(), to.1),
    ))
}

fn kinds(session: &EditorSession) -> Vec<String> {
    session.doc().root().content.iter().map(|n| n.kind.clone()).collect()
}

#[test]
fn test_undo_redo_restore_every_step() {
    let mut session = session("<p>Hello world</p><p>Second paragraph</p>");
    let script = vec![
        select((&[0], 0), (&[0], 5)),
        Command::ToggleMark(FormatMark::Bold),
        Command::SetLink {
            href: "https://example.com".into(),
            target: None,
        },
        Command::ToggleHeading(2),
        Command::SetTextAlign(TextAlign::Center),
        caret(&[1], 6),
        Command::SplitBlock,
        Command::InsertText("new ".into()),
        Command::ToggleBulletList,
        Command::ToggleTaskList,
        Command::ToggleTaskChecked,
        Command::InsertHorizontalRule,
        Command::InsertTable {
            rows: 2,
            cols: 2,
            with_header_row: true,
        },
        Command::AddColumnAfter,
        Command::InsertText("cell".into()),
        Command::DeleteBackward,
        Command::ToggleBlockquote,
    ];

    let mut befores = Vec::new();
    let mut afters = Vec::new();
    for command in &script {
        let before = (session.doc().clone(), session.selection().clone());
        let levels = session.history().undo_levels();
        session
            .execute(command)
            .unwrap_or_else(|err| panic!("{:?} failed: {}", command, err));
        if session.history().undo_levels() > levels {
            befores.push(before);
            afters.push((session.doc().clone(), session.selection().clone()));
        }
    }
    assert_eq!(befores.len(), script.len() - 2);

    for expected in befores.iter().rev() {
        assert!(session.undo().unwrap());
        assert_eq!(session.doc(), &expected.0);
        assert_eq!(session.selection(), &expected.1);
    }
    assert!(!session.undo().unwrap());

    for expected in &afters {
        assert!(session.redo().unwrap());
        assert_eq!(session.doc(), &expected.0);
        assert_eq!(session.selection(), &expected.1);
    }
    assert!(!session.redo().unwrap());
}

#[test]
fn test_table_commands_only_inside_cells() {
    let mut session = session("<p>before</p>");
    assert!(!session.can_execute(&Command::AddColumnBefore));
    assert!(matches!(
        session.execute(&Command::AddColumnBefore),
        Err(EditorError::Command(CommandError::Unapplicable(_)))
    ));
    assert!(!session.toolbar().can_add_column);

    session
        .execute(&Command::InsertTable {
            rows: 1,
            cols: 1,
            with_header_row: false,
        })
        .unwrap();
    assert!(session.can_execute(&Command::AddColumnBefore));
    let toolbar = session.toolbar();
    assert!(toolbar.table);
    assert!(toolbar.can_add_column);
    assert!(!toolbar.can_delete_column);
    assert!(!toolbar.can_delete_row);

    session.execute(&Command::AddColumnBefore).unwrap();
    let table = session.doc().node_at(&[1]).unwrap();
    assert_eq!(table.content[0].content.len(), 2);
    assert!(session.toolbar().can_delete_column);
}

#[test]
fn test_embed_acceptance() {
    let mut session = session("<p>intro</p>");
    session
        .execute(&Command::InsertVideo("https://youtu.be/dQw4w9WgXcQ".into()))
        .unwrap();
    let video = session.doc().node_at(&[1]).unwrap();
    assert_eq!(video.kind, "video_embed");
    assert_eq!(
        video.attrs.get("src").and_then(AttrValue::as_str),
        Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
    );

    let before = session.doc().clone();
    let err = session
        .execute(&Command::InsertVideo("https://vimeo.com/12345".into()))
        .unwrap_err();
    assert_eq!(
        err,
        EditorError::Command(CommandError::InvalidEmbedUrl {
            kind: EmbedKind::Video,
            url: "https://vimeo.com/12345".into(),
        })
    );
    assert_eq!(session.doc(), &before);

    let post = "https://x.com/someone/status/42";
    session.execute(&Command::InsertSocialPost(post.into())).unwrap();
    let stored = session
        .doc()
        .root()
        .content
        .iter()
        .find(|n| n.kind == "social_embed")
        .and_then(|n| n.attrs.get("url"))
        .and_then(AttrValue::as_str)
        .map(str::to_string);
    assert_eq!(stored.as_deref(), Some(post));
}

#[test]
fn test_selection_follows_deletion_before_it() {
    let mut session = session("<p>first</p><p>second</p>");
    session.execute(&caret(&[1], 3)).unwrap();
    session
        .dispatch(Transaction::new().step(Step::Delete {
            parent: vec![],
            from: 0,
            to: 1,
        }))
        .unwrap();
    assert_eq!(session.selection(), &Selection::caret(Position::new(vec![0], 3)));
    assert!(session.history().can_undo());
}

#[test]
fn test_rejected_transaction_changes_nothing() {
    let mut session = session("<p>only</p>");
    let before = session.doc().clone();
    let result = session.dispatch(Transaction::new().step(Step::Delete {
        parent: vec![],
        from: 0,
        to: 1,
    }));
    assert!(matches!(result, Err(EditorError::Transaction(_))));
    assert_eq!(session.doc(), &before);
    assert!(!session.history().can_undo());
}

#[test]
fn test_markup_round_trip_through_session() {
    let markup = "<h2 style=\"text-align: center\">Title</h2><p>Some <strong>bold</strong> and <a href=\"/x\">link</a></p><hr>";
    let first = session(markup);
    let second = session(&first.to_html());
    assert_eq!(first.doc(), second.doc());
    assert_eq!(first.to_html(), second.to_html());
}

/// Every command that stores user-typed values, with values chosen to
/// break attribute quoting or sneak in extra declarations
fn hostile_value_commands() -> Vec<Command> {
    let hrefs = [
        "https://example.com/?q=a&b=<c>",
        "/path\" onclick=\"x",
        "  https://example.com/'quoted'  ",
        "javascript:alert(1)",
        "JaVaScRiPt:alert(1)",
        "data:text/html,<script>",
        "mailto:a@b.c?subject=a&amp;b",
    ];
    let targets = [None, Some("_blank"), Some("x\" y=\"z"), Some("")];
    let colors = [
        "red",
        " #00ff00 ",
        "rgb(1, 2, 3)",
        "red; background: url(x)",
        "red\"><script>",
        "url(a:b)",
        "&amp;",
        "",
    ];

    let mut commands = Vec::new();
    for href in hrefs {
        for target in targets {
            commands.push(Command::SetLink {
                href: href.to_string(),
                target: target.map(str::to_string),
            });
        }
    }
    for color in colors {
        commands.push(Command::SetColor(color.to_string()));
        commands.push(Command::SetHighlight(Some(color.to_string())));
    }
    commands.push(Command::SetHighlight(None));
    for text in ["plain", "a \"quote\"", "<b>&amp;</b>", "it's", ""] {
        commands.push(Command::InsertImage {
            src: format!("/img/{}.png?x=1&y=\"2\"", text),
            alt: Some(text.to_string()),
            title: Some(text.to_string()).filter(|t| !t.is_empty()),
        });
    }
    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42&list=\"x\"",
        "youtu.be/dQw4w9WgXcQ?si=<a>",
        "https://vimeo.com/1",
    ] {
        commands.push(Command::InsertVideo(url.to_string()));
    }
    for url in [
        "https://x.com/acct/status/1234567890?s=20&t=x",
        "https://twitter.com/acct/status/42\"><script>",
        "https://x.com/acct",
    ] {
        commands.push(Command::InsertSocialPost(url.to_string()));
    }
    commands
}

#[test]
fn test_stored_values_survive_markup_round_trip() {
    let schema = Arc::new(article_schema().unwrap());
    let source = "<p>Hello world</p><p>again</p>";
    let pristine = session(source);
    let mut applied = 0;
    for command in hostile_value_commands() {
        let mut editor = session(source);
        editor.execute(&select((&[0], 2), (&[1], 3))).unwrap();
        if editor.execute(&command).is_err() {
            assert_eq!(editor.doc(), pristine.doc());
            continue;
        }
        applied += 1;
        for ctx in [RenderContext::light(), RenderContext::dark()] {
            let markup = serialize(editor.doc(), &ctx);
            assert!(!markup.contains("<script"), "{:?} leaked markup: {}", command, markup);
            let reparsed = deserialize(schema.clone(), &markup);
            assert_eq!(&reparsed, editor.doc(), "{:?} did not survive: {}", command, markup);
        }
    }
    assert!(applied > 20);
}

/// Uploader whose results are released by the test
struct ManualUploader {
    pending: RefCell<Vec<oneshot::Receiver<Result<UploadedAsset, UploadError>>>>,
}

impl ManualUploader {
    fn new() -> (Self, oneshot::Sender<Result<UploadedAsset, UploadError>>) {
        let (tx, rx) = oneshot::channel();
        let uploader = Self {
            pending: RefCell::new(vec![rx]),
        };
        (uploader, tx)
    }
}

impl AssetUploader for ManualUploader {
    fn upload_asset(&self, _file: LocalFile) -> LocalBoxFuture<'_, Result<UploadedAsset, UploadError>> {
        let rx = self.pending.borrow_mut().remove(0);
        async move { rx.await.unwrap_or(Err(UploadError::Cancelled)) }.boxed_local()
    }
}

type Outcome = Rc<RefCell<Option<Result<bool, EditorError>>>>;

/// Start an upload for `session` and run it until it waits on the uploader
fn start_upload(
    pool: &mut LocalPool,
    session: &Rc<RefCell<EditorSession>>,
    kind: AssetKind,
) -> (Outcome, oneshot::Sender<Result<UploadedAsset, UploadError>>) {
    let (uploader, release) = ManualUploader::new();
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let weak = Rc::downgrade(session);
    let slot = outcome.clone();
    pool.spawner()
        .spawn_local(async move {
            let file = LocalFile::new("photo.png", "image/png", vec![1, 2, 3]);
            let result = insert_asset(weak, &uploader, kind, file).await;
            *slot.borrow_mut() = Some(result);
        })
        .unwrap();
    pool.run_until_stalled();
    (outcome, release)
}

fn uploaded(url: &str) -> Result<UploadedAsset, UploadError> {
    Ok(UploadedAsset {
        access_url: url.to_string(),
    })
}

#[test]
fn test_image_lands_at_remapped_position() {
    let shared = Rc::new(RefCell::new(session("<p>first</p><p>second</p>")));
    shared.borrow_mut().execute(&caret(&[0], 5)).unwrap();

    let mut pool = LocalPool::new();
    let (outcome, release) = start_upload(&mut pool, &shared, AssetKind::ContentImage);
    assert_eq!(shared.borrow().pending_assets(), 1);
    assert!(outcome.borrow().is_none());

    // The author keeps editing while the upload runs
    {
        let mut session = shared.borrow_mut();
        session.execute(&caret(&[0], 0)).unwrap();
        session.execute(&Command::SplitBlock).unwrap();
    }

    release.send(uploaded("https://cdn.example/photo.png")).unwrap();
    pool.run_until_stalled();
    assert_eq!(*outcome.borrow(), Some(Ok(true)));

    let mut session = shared.borrow_mut();
    assert_eq!(kinds(&session), vec!["paragraph", "paragraph", "image", "paragraph"]);
    assert_eq!(session.doc().node_at(&[1]).unwrap().text_content(), "first");
    let image = session.doc().node_at(&[2]).unwrap();
    assert_eq!(
        image.attrs.get("src").and_then(AttrValue::as_str),
        Some("https://cdn.example/photo.png")
    );
    assert_eq!(session.selection(), &Selection::caret(Position::new(vec![1], 0)));
    assert_eq!(session.pending_assets(), 0);

    // Placing the image is one undo step of its own
    assert!(session.undo().unwrap());
    assert_eq!(kinds(&session), vec!["paragraph", "paragraph", "paragraph"]);
}

#[test]
fn test_cover_upload_is_stored_on_session() {
    let shared = Rc::new(RefCell::new(session("<p>body</p>")));
    let mut pool = LocalPool::new();
    let (outcome, release) = start_upload(&mut pool, &shared, AssetKind::Cover);
    release.send(uploaded("https://cdn.example/cover.jpg")).unwrap();
    pool.run_until_stalled();

    assert_eq!(*outcome.borrow(), Some(Ok(true)));
    let session = shared.borrow();
    assert_eq!(session.cover_image(), Some("https://cdn.example/cover.jpg"));
    assert_eq!(kinds(&session), vec!["paragraph"]);
}

#[test]
fn test_failed_upload_leaves_tree_untouched() {
    let shared = Rc::new(RefCell::new(session("<p>body</p>")));
    let before = shared.borrow().doc().clone();
    let mut pool = LocalPool::new();
    let (outcome, release) = start_upload(&mut pool, &shared, AssetKind::ContentImage);
    release.send(Err(UploadError::Rejected("quota".into()))).unwrap();
    pool.run_until_stalled();

    assert_eq!(
        *outcome.borrow(),
        Some(Err(EditorError::Asset(AssetError::UploadFailed(UploadError::Rejected(
            "quota".into()
        )))))
    );
    let session = shared.borrow();
    assert_eq!(session.doc(), &before);
    assert_eq!(session.pending_assets(), 0);
    assert!(!session.history().can_undo());
}

#[test]
fn test_upload_after_close_is_dropped() {
    let shared = Rc::new(RefCell::new(session("<p>body</p>")));
    let before = shared.borrow().doc().clone();
    let mut pool = LocalPool::new();
    let (outcome, release) = start_upload(&mut pool, &shared, AssetKind::ContentImage);

    shared.borrow_mut().close();
    release.send(uploaded("https://cdn.example/late.png")).unwrap();
    pool.run_until_stalled();

    assert_eq!(*outcome.borrow(), Some(Ok(false)));
    assert_eq!(shared.borrow().doc(), &before);
}

#[test]
fn test_upload_after_session_dropped() {
    let shared = Rc::new(RefCell::new(session("<p>body</p>")));
    let mut pool = LocalPool::new();
    let (outcome, release) = start_upload(&mut pool, &shared, AssetKind::ContentImage);

    drop(shared);
    release.send(uploaded("https://cdn.example/late.png")).unwrap();
    pool.run_until_stalled();
    assert_eq!(*outcome.borrow(), Some(Ok(false)));
}

#[test]
fn test_invalid_file_never_reaches_session() {
    let shared = Rc::new(RefCell::new(session("<p>body</p>")));
    let (uploader, _release) = ManualUploader::new();
    let file = LocalFile::new("notes.txt", "text/plain", vec![0; 4]);
    let result = futures::executor::block_on(insert_asset(
        Rc::downgrade(&shared),
        &uploader,
        AssetKind::ContentImage,
        file,
    ));
    assert!(matches!(result, Err(EditorError::Asset(AssetError::InvalidFile(_)))));
    assert_eq!(shared.borrow().pending_assets(), 0);
}
