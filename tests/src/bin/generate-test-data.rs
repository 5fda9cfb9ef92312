use chrono::{Duration, Utc};
use coral_api::{Comment, CommentId, CommentStatus, Settings, Story, StoryId, UserId, Uuid, Viewer};
use coral_mock_server::Fixture;
use rand::Rng;

const NUM_USERS: usize = 5;
const NUM_THREADS: usize = 20;

// deeper than the thread levels, so that the terminal depth gets exercised
const MAX_DEPTH: usize = 5;
const MAX_REPLIES: usize = 6;

const COMMENT_WORD_COUNT: usize = 25;

fn gen_status(rng: &mut impl Rng) -> CommentStatus {
    match rng.gen_range(0..20) {
        0 => CommentStatus::Premod,
        1 => CommentStatus::Rejected,
        2..=5 => CommentStatus::Approved,
        _ => CommentStatus::None,
    }
}

fn gen_replies(
    rng: &mut impl Rng,
    users: &[UserId],
    parent: &Comment,
    depth: usize,
    out: &mut Vec<Comment>,
) {
    if depth > MAX_DEPTH {
        return;
    }
    let n = rng.gen_range(0..=MAX_REPLIES / depth);
    let mut date = parent.created_at;
    for _ in 0..n {
        date = date + Duration::minutes(rng.gen_range(1..120));
        let reply = Comment {
            id: CommentId(Uuid::new_v4()),
            story_id: parent.story_id,
            parent_id: Some(parent.id),
            author_id: Some(users[rng.gen_range(0..users.len())]),
            body: lipsum::lipsum_words(rng.gen_range(1..COMMENT_WORD_COUNT)),
            created_at: date,
            status: gen_status(rng),
            last_viewer_action: None,
            reply_count: None,
            entered_live: Some(rng.gen_bool(0.1)),
        };
        gen_replies(rng, users, &reply, depth + 1, out);
        out.push(reply);
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|_| UserId(Uuid::new_v4()))
        .collect::<Vec<_>>();
    let story = Story {
        id: StoryId(Uuid::new_v4()),
        ..Story::stub()
    };

    let mut comments = Vec::new();
    let start = Utc::now() - Duration::days(7);
    for i in 0..NUM_THREADS {
        let top = Comment {
            id: CommentId(Uuid::new_v4()),
            story_id: story.id,
            parent_id: None,
            author_id: Some(users[rng.gen_range(0..users.len())]),
            body: lipsum::lipsum_words(COMMENT_WORD_COUNT),
            created_at: start + Duration::hours(i as i64),
            status: CommentStatus::None,
            last_viewer_action: None,
            reply_count: None,
            entered_live: Some(false),
        };
        gen_replies(&mut rng, &users, &top, 1, &mut comments);
        comments.push(top);
    }

    let fixture = Fixture {
        story,
        settings: Settings::default(),
        viewer: Some(Viewer {
            id: users[0],
            username: String::from("viewer"),
        }),
        comments,
    };
    println!("{}", serde_json::to_string_pretty(&fixture)?);
    Ok(())
}
