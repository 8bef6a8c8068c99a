use surrealdb::sql::Thing;

/// Accepts both `table:key` and bare `key` forms and returns the key.
pub fn parse_id_part(id: &str) -> &str {
    match id.split_once(':') {
        Some((_, key)) => key,
        None => id,
    }
}

pub fn create_thing(table: &str, id: &str) -> Thing {
    Thing::from((table.to_string(), parse_id_part(id.trim()).to_string()))
}

pub fn create_user_thing(user_id: &str) -> Thing {
    create_thing("user", user_id)
}

pub fn create_song_thing(song_id: &str) -> Thing {
    create_thing("song", song_id)
}

pub fn create_comment_thing(comment_id: &str) -> Thing {
    create_thing("comment", comment_id)
}

pub fn create_songlist_thing(songlist_id: &str) -> Thing {
    create_thing("songlist", songlist_id)
}

/// The key clients see for a record, without table prefix or escaping.
pub fn record_key(thing: &Thing) -> String {
    thing.id.to_raw()
}
